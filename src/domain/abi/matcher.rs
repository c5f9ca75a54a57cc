//! Selector / topic matching against a descriptor set
//!
//! Matching walks descriptors in declaration order and the first match wins,
//! so two entries that collide on a selector resolve to the earlier one.

use super::selector::{derive_event_topic, derive_selector};
use super::types::AbiDescriptor;

/// Find the function whose derived selector equals `selector` (case-insensitive)
pub fn find_matching_function<'a>(
    descriptors: &'a [AbiDescriptor],
    selector: impl AsRef<str>,
) -> Option<&'a AbiDescriptor> {
    let selector = selector.as_ref().trim();
    descriptors
        .iter()
        .filter(|descriptor| descriptor.is_function())
        .find(|descriptor| {
            derive_selector(&descriptor.signature())
                .as_str()
                .eq_ignore_ascii_case(selector)
        })
}

/// Find the non-anonymous event whose full signature hash equals `topic`
pub fn find_matching_event<'a>(
    descriptors: &'a [AbiDescriptor],
    topic: impl AsRef<str>,
) -> Option<&'a AbiDescriptor> {
    let topic = topic.as_ref().trim();
    descriptors
        .iter()
        .filter(|descriptor| descriptor.is_event() && !descriptor.anonymous)
        .find(|descriptor| derive_event_topic(&descriptor.signature()).eq_ignore_ascii_case(topic))
}
