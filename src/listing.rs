//! One normalizer for the response shapes the backend uses.

use crate::{ExValue, statics};

/// A list response reduced to its items.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Listing {
    Items {
        items: Vec<ExValue>,
        total: usize,
    },
    #[default]
    Empty,
}

impl Listing {
    /// Try each known shape in turn:
    /// raw array, `{results, count}`, `{success, data}` wrapping either. Anything else is empty.
    pub fn from_response(response: &ExValue) -> Self {
        Self::from_shape(response, true)
    }

    fn from_shape(response: &ExValue, allow_envelope: bool) -> Self {
        match response {
            ExValue::Array(items) => Self::from_items(items.clone(), None),
            ExValue::Object(map) => {
                if map.get(statics::API_SUCCESS).and_then(ExValue::as_bool) == Some(false) {
                    return Listing::Empty;
                }
                if let Some(items) = map.get(statics::API_RESULTS).and_then(ExValue::as_array) {
                    let count = map
                        .get(statics::API_COUNT)
                        .and_then(ExValue::as_i64)
                        .and_then(|c| usize::try_from(c).ok());
                    return Self::from_items(items.to_vec(), count);
                }
                match map.get(statics::API_DATA) {
                    Some(data) if allow_envelope => Self::from_shape(data, false),
                    _ => Listing::Empty,
                }
            }
            _ => Listing::Empty,
        }
    }

    fn from_items(items: Vec<ExValue>, count: Option<usize>) -> Self {
        if items.is_empty() && count.unwrap_or(0) == 0 {
            return Listing::Empty;
        }
        let total = count.unwrap_or(items.len()).max(items.len());
        Listing::Items { items, total }
    }

    pub fn items(&self) -> &[ExValue] {
        match self {
            Listing::Items { items, .. } => items,
            Listing::Empty => &[],
        }
    }

    pub fn into_items(self) -> Vec<ExValue> {
        match self {
            Listing::Items { items, .. } => items,
            Listing::Empty => Vec::new(),
        }
    }

    /// Total matching records on the server, which may exceed the page.
    pub fn total(&self) -> usize {
        match self {
            Listing::Items { total, .. } => *total,
            Listing::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Listing::Empty)
    }
}

/// Strip a `{success, data}` envelope from a single-record response.
pub fn unwrap_record(response: ExValue) -> ExValue {
    let is_envelope = response.get(statics::API_SUCCESS).is_some()
        && matches!(response.get(statics::API_DATA), Some(ExValue::Object(_)));
    if !is_envelope {
        return response;
    }
    match response {
        ExValue::Object(mut map) => map.shift_remove(statics::API_DATA).unwrap_or_default(),
        other => other,
    }
}

/// The record's id as text, whether the backend sent a number or a string.
pub fn record_id(record: &ExValue) -> Option<String> {
    match record.get(statics::REC_FIELD_ID)? {
        ExValue::String(s) if !s.is_empty() => Some(s.clone()),
        ExValue::Number(n) => Some(n.to_edit_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Listing, record_id, unwrap_record};
    use crate::ExValue;
    use serde_json::json;

    fn ids(listing: &Listing) -> Vec<String> {
        listing.items().iter().filter_map(record_id).collect()
    }

    #[test]
    fn every_known_shape_normalizes() {
        let raw = ExValue::from(json!([{ "id": 1 }, { "id": 2 }]));
        let paged = ExValue::from(json!({ "results": [{ "id": 1 }], "count": 40 }));
        let wrapped = ExValue::from(json!({ "success": true, "data": [{ "id": "a" }] }));
        let wrapped_paged = ExValue::from(json!({
            "success": true,
            "data": { "results": [{ "id": 3 }], "count": 1 }
        }));

        let l = Listing::from_response(&raw);
        assert_eq!((ids(&l), l.total()), (vec!["1".into(), "2".into()], 2));
        let l = Listing::from_response(&paged);
        assert_eq!((ids(&l), l.total()), (vec!["1".into()], 40));
        let l = Listing::from_response(&wrapped);
        assert_eq!(ids(&l), vec!["a".to_string()]);
        let l = Listing::from_response(&wrapped_paged);
        assert_eq!((ids(&l), l.total()), (vec!["3".into()], 1));
    }

    #[test]
    fn failures_and_unknown_shapes_are_empty() {
        for v in [
            json!({ "success": false, "data": [{ "id": 1 }] }),
            json!({ "items": [1, 2] }),
            json!("nope"),
            json!([]),
            json!({ "data": { "data": [{ "id": 1 }] } }),
        ] {
            assert!(Listing::from_response(&ExValue::from(v)).is_empty());
        }
    }

    #[test]
    fn unwrap_record_strips_envelopes_only() {
        let wrapped = ExValue::from(json!({ "success": true, "data": { "id": 9 } }));
        assert_eq!(unwrap_record(wrapped), ExValue::from(json!({ "id": 9 })));

        // A record that merely has a `data` field stays intact.
        let plain = ExValue::from(json!({ "id": 1, "data": { "x": 1 } }));
        assert_eq!(unwrap_record(plain.clone()), plain);
    }
}
