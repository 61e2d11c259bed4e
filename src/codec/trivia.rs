use super::{document, Decode, Encode, Fields};
use crate::ast::FodderElement;
use crate::error::SchemaError;
use serde_json::Value;

impl Encode for FodderElement {
    fn encode(&self) -> Value {
        Value::Object(document! {
            "comment" => self.comment.clone(),
            "kind" => self.kind.encode(),
            "blanks" => self.blanks,
            "indent" => self.indent,
        })
    }
}

impl Decode for FodderElement {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        let fields = Fields::of(value)?;
        if !fields.has("kind") {
            return Err(SchemaError::new("fodder element without a kind").within("kind"));
        }
        Ok(FodderElement {
            kind: fields.decode("kind")?,
            blanks: fields.count("blanks")?,
            indent: fields.count("indent")?,
            comment: fields.decode("comment")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Fodder, FodderKind};
    use serde_json::json;

    #[test]
    fn element_fields_round_trip() {
        let fodder: Fodder = vec![
            FodderElement::new(FodderKind::Paragraph, 1, 2, vec!["// a".into(), "// b".into()]),
            FodderElement::new(FodderKind::Interstitial, 0, 0, vec!["/* c */".into()]),
            FodderElement::line_end(),
        ];
        let encoded = fodder.encode();
        assert_eq!(
            encoded[0],
            json!({ "comment": ["// a", "// b"], "kind": 2, "blanks": 1, "indent": 2 })
        );
        assert_eq!(encoded[2], json!({ "comment": [], "kind": 0, "blanks": 0, "indent": 0 }));
        assert_eq!(Fodder::decode(&encoded).unwrap(), fodder);
    }

    #[test]
    fn null_comment_reads_as_no_comment() {
        let element =
            FodderElement::decode(&json!({ "comment": null, "kind": 0, "blanks": 2, "indent": 4 }))
                .unwrap();
        assert_eq!(element, FodderElement::new(FodderKind::LineEnd, 2, 4, vec![]));
    }

    #[test]
    fn element_needs_a_kind() {
        let err = FodderElement::decode(&json!({ "comment": [] })).unwrap_err();
        assert_eq!(err.path, "/kind");
    }
}
