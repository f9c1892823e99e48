//! Template substitution for binder/decision identifiers.
//!
//! Decision ids and binder names may contain `{name}` placeholders
//! referring to bindings in scope (`"deploy:{zone}"` instantiates once
//! per zone a surrounding loop visits). Substitution is an explicit two
//! step process: instantiate into a canonical string key, then look the
//! key up wherever it is needed. Keeping the first step separate makes
//! it independently testable.

use crate::core::Value;
use crate::error::{EngineError, EngineResult};
use crate::eval::Bindings;

/// Instantiate `{name}` placeholders from bindings.
///
/// Placeholders must name bindings in scope; an unbound placeholder is
/// an unbound-selector error whose `deferred` flag follows `strict`.
/// Text outside placeholders passes through untouched. A `{` without a
/// closing `}` is a malformed template and always fatal.
pub fn instantiate(template: &str, bindings: &Bindings, strict: bool) -> EngineResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(EngineError::Definition {
                ctx: crate::error::ErrorContext::new("effect", "decision-template"),
                detail: format!("unterminated placeholder in `{template}`"),
            });
        };
        let name = &after[..close];
        match bindings.get(name) {
            Some(value) => out.push_str(&render(value)),
            None => {
                return Err(EngineError::UnboundSelector {
                    name: name.to_string(),
                    deferred: !strict,
                })
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Canonical placeholder rendering: compact, stable across replays.
fn render(value: &Value) -> String {
    match value {
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Str(s) => s.clone(),
        Value::Player(p) => format!("p{}", p.0),
        Value::Zone(z) => format!("z{}", z.0),
        Value::Token(t) => format!("t{}", t.0),
        Value::TokenType(t) => format!("ty{}", t.0),
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(render).collect();
            parts.join("+")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlayerId, TokenId, ZoneId};

    fn bindings() -> Bindings {
        let mut b = Bindings::new();
        b.insert("zone".into(), Value::Zone(ZoneId::new(4)));
        b.insert("who".into(), Value::Player(PlayerId::new(1)));
        b.insert("n".into(), Value::Int(3));
        b
    }

    #[test]
    fn test_plain_text_passes_through() {
        let b = Bindings::new();
        assert_eq!(instantiate("deploy", &b, true).unwrap(), "deploy");
    }

    #[test]
    fn test_placeholder_substitution() {
        let b = bindings();
        assert_eq!(
            instantiate("deploy:{zone}", &b, true).unwrap(),
            "deploy:z4"
        );
        assert_eq!(
            instantiate("{who}-takes-{n}", &b, true).unwrap(),
            "p1-takes-3"
        );
    }

    #[test]
    fn test_unbound_placeholder_follows_strictness() {
        let b = Bindings::new();

        let lax = instantiate("x:{missing}", &b, false).unwrap_err();
        assert!(lax.is_deferred());

        let strict = instantiate("x:{missing}", &b, true).unwrap_err();
        assert!(!strict.is_deferred());
    }

    #[test]
    fn test_unterminated_placeholder_is_definition_error() {
        let b = bindings();
        let err = instantiate("bad:{zone", &b, true).unwrap_err();
        assert!(matches!(err, EngineError::Definition { .. }));
    }

    #[test]
    fn test_token_rendering_is_stable() {
        let mut b = Bindings::new();
        b.insert("t".into(), Value::Token(TokenId::new(12)));
        assert_eq!(instantiate("remove:{t}", &b, true).unwrap(), "remove:t12");
    }

    #[test]
    fn test_same_bindings_same_key() {
        let b = bindings();
        let k1 = instantiate("a:{zone}:{n}", &b, true).unwrap();
        let k2 = instantiate("a:{zone}:{n}", &b, true).unwrap();
        assert_eq!(k1, k2);
    }
}
