//! Integer wire codes for the small enums of the tree.

use super::{decode_count, Decode, Encode};
use crate::ast::{
    BinaryOp, FodderKind, LiteralStringKind, ObjectFieldHide, ObjectFieldKind, UnaryOp,
};
use crate::error::SchemaError;
use serde_json::Value;

macro_rules! wire_codes {
    ($ty:ident, $what:literal { $($variant:ident = $code:literal),+ $(,)? }) => {
        impl Encode for $ty {
            fn encode(&self) -> Value {
                let code: u64 = match self {
                    $($ty::$variant => $code,)+
                };
                Value::from(code)
            }
        }

        impl Decode for $ty {
            fn decode(value: &Value) -> Result<Self, SchemaError> {
                match decode_count(value)? {
                    $($code => Ok($ty::$variant),)+
                    other => Err(SchemaError::new(format!(
                        "unknown {} code {}",
                        $what, other
                    ))),
                }
            }
        }
    };
}

wire_codes!(FodderKind, "fodder kind" {
    LineEnd = 0,
    Interstitial = 1,
    Paragraph = 2,
});

wire_codes!(BinaryOp, "binary operator" {
    Mult = 0,
    Div = 1,
    Percent = 2,
    Plus = 3,
    Minus = 4,
    ShiftL = 5,
    ShiftR = 6,
    Greater = 7,
    GreaterEq = 8,
    Less = 9,
    LessEq = 10,
    In = 11,
    ManifestEqual = 12,
    ManifestUnequal = 13,
    BitwiseAnd = 14,
    BitwiseXor = 15,
    BitwiseOr = 16,
    And = 17,
    Or = 18,
});

wire_codes!(UnaryOp, "unary operator" {
    Not = 0,
    BitwiseNot = 1,
    Plus = 2,
    Minus = 3,
});

wire_codes!(LiteralStringKind, "string kind" {
    Single = 0,
    Double = 1,
    Block = 2,
    VerbatimDouble = 3,
    VerbatimSingle = 4,
});

wire_codes!(ObjectFieldKind, "object field kind" {
    Assert = 0,
    FieldId = 1,
    FieldExpr = 2,
    FieldStr = 3,
    Local = 4,
});

wire_codes!(ObjectFieldHide, "field visibility" {
    Hidden = 0,
    Inherit = 1,
    Visible = 2,
});

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operators_use_stable_codes() {
        assert_eq!(BinaryOp::Mult.encode(), json!(0));
        assert_eq!(BinaryOp::ManifestEqual.encode(), json!(12));
        assert_eq!(BinaryOp::Or.encode(), json!(18));
        assert_eq!(UnaryOp::Minus.encode(), json!(3));
        assert_eq!(BinaryOp::decode(&json!(7)).unwrap(), BinaryOp::Greater);
    }

    #[test]
    fn visibility_codes_follow_colon_count() {
        assert_eq!(ObjectFieldHide::decode(&json!(0)).unwrap(), ObjectFieldHide::Hidden);
        assert_eq!(ObjectFieldHide::decode(&json!(1)).unwrap(), ObjectFieldHide::Inherit);
        assert_eq!(ObjectFieldHide::decode(&json!(2)).unwrap(), ObjectFieldHide::Visible);
    }

    #[test]
    fn out_of_range_codes_are_rejected() {
        let err = FodderKind::decode(&json!(3)).unwrap_err();
        assert_eq!(err.message, "unknown fodder kind code 3");
        assert!(LiteralStringKind::decode(&json!("Single")).is_err());
    }
}
