//! Named charset registry: built-ins, user definitions, reference expansion.
//!
//! A name may be bound more than once. The most recent binding is the
//! visible one, but earlier bindings stay reachable: a definition that
//! references its own name is resolved against its predecessor, one
//! predecessor per occurrence. This is what lets `-c l:?l0123` extend the
//! built-in `?l` instead of recursing forever.

use std::collections::BTreeMap;

use log::debug;

use crate::alphabet::Alphabet;
use crate::charset::Charset;
use crate::error::{Error, Result};

/// One definition bound to a charset name.
pub struct CharsetDef<A: Alphabet> {
    body: Vec<A::Cp>,
    /// True once `body` contains no `?`-references.
    resolved: bool,
}

impl<A: Alphabet> Clone for CharsetDef<A> {
    fn clone(&self) -> Self {
        Self {
            body: self.body.clone(),
            resolved: self.resolved,
        }
    }
}

impl<A: Alphabet> CharsetDef<A> {
    /// The definition body. Only meaningful as a charset once resolved.
    pub fn body(&self) -> &[A::Cp] {
        &self.body
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// All charset names known to a run, in definition order per name.
pub struct Registry<A: Alphabet> {
    defs: BTreeMap<A::Cp, Vec<CharsetDef<A>>>,
}

impl<A: Alphabet> Clone for Registry<A> {
    fn clone(&self) -> Self {
        Self {
            defs: self.defs.clone(),
        }
    }
}

impl<A: Alphabet> Registry<A> {
    /// A registry holding the built-in charsets, unexpanded.
    ///
    /// `?a` is stored as `?l?u?d?s` and resolved by
    /// [`expand_all`](Registry::expand_all); `?b` exists in byte mode only.
    pub fn with_builtins() -> Self {
        fn lift<A: Alphabet>(body: &[u8]) -> Vec<A::Cp> {
            body.iter().map(|&b| A::ascii(b)).collect()
        }

        let mut reg = Self {
            defs: BTreeMap::new(),
        };
        reg.define(A::ascii(b'l'), lift::<A>(b"abcdefghijklmnopqrstuvwxyz"), true);
        reg.define(A::ascii(b'u'), lift::<A>(b"ABCDEFGHIJKLMNOPQRSTUVWXYZ"), true);
        reg.define(A::ascii(b'd'), lift::<A>(b"0123456789"), true);
        reg.define(
            A::ascii(b's'),
            lift::<A>(b" !\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~"),
            true,
        );
        reg.define(A::ascii(b'h'), lift::<A>(b"0123456789abcdef"), true);
        reg.define(A::ascii(b'H'), lift::<A>(b"0123456789ABCDEF"), true);
        reg.define(A::ascii(b'n'), lift::<A>(b"\n"), true);
        reg.define(A::ascii(b'r'), lift::<A>(b"\r"), true);
        reg.define(A::ascii(b'a'), lift::<A>(b"?l?u?d?s"), false);
        if A::FULL_BYTE_CLASS {
            reg.define(A::ascii(b'b'), (0u8..=255).map(A::ascii).collect(), true);
        }
        reg
    }

    /// Bind `body` to `name`. Earlier bindings of the same name are kept
    /// and remain reachable from self-referential definitions.
    pub fn define(&mut self, name: A::Cp, body: Vec<A::Cp>, resolved: bool) {
        self.defs
            .entry(name)
            .or_default()
            .push(CharsetDef { body, resolved });
    }

    /// The visible (most recent) definition of `name`.
    pub fn lookup(&self, name: A::Cp) -> Option<&CharsetDef<A>> {
        self.defs.get(&name).and_then(|defs| defs.last())
    }

    /// Resolve every `?`-reference in the visible definition of `name`,
    /// deduplicate the result, and mark it resolved.
    ///
    /// Expansion is idempotent on resolved definitions.
    pub fn expand(&mut self, name: A::Cp) -> Result<()> {
        let defs = self.defs.get(&name).ok_or_else(|| Error::UnknownCharset {
            name: A::display(name),
        })?;
        let last = defs.last().ok_or_else(|| Error::UnknownCharset {
            name: A::display(name),
        })?;
        if last.resolved {
            return Ok(());
        }

        let body = last.body.clone();
        let mut history = vec![name];
        let expanded = self.expand_body(&body, &mut history)?;
        let expanded = dedup_preserving_order::<A>(expanded);
        if expanded.is_empty() {
            return Err(Error::EmptyCharset {
                name: A::display(name),
            });
        }
        debug!(
            "expanded charset '{}' to {} codepoints",
            A::display(name),
            expanded.len()
        );

        let def = self
            .defs
            .get_mut(&name)
            .and_then(|defs| defs.last_mut())
            .ok_or_else(|| Error::UnknownCharset {
                name: A::display(name),
            })?;
        def.body = expanded;
        def.resolved = true;
        Ok(())
    }

    /// Expand the visible definition of every known name.
    pub fn expand_all(&mut self) -> Result<()> {
        let names: Vec<A::Cp> = self.defs.keys().copied().collect();
        for name in names {
            self.expand(name)?;
        }
        Ok(())
    }

    /// Resolve an anonymous body against this registry without binding it
    /// to any name. Used for bruteforce constraint charsets, which have no
    /// user-visible name and therefore cannot be self-referential.
    pub fn expand_detached(&self, body: &[A::Cp]) -> Result<Vec<A::Cp>> {
        let mut history = Vec::new();
        Ok(dedup_preserving_order::<A>(
            self.expand_body(body, &mut history)?,
        ))
    }

    /// Build a charset from the visible, resolved definition of `name`.
    ///
    /// The charset shares its body with nothing else in the registry; each
    /// call hands out an independent cursor.
    pub fn charset(&self, name: A::Cp) -> Result<Charset<A>> {
        let def = self.lookup(name).ok_or_else(|| Error::UnknownCharset {
            name: A::display(name),
        })?;
        debug_assert!(def.resolved, "charset referenced before expansion");
        Charset::new(&def.body).map_err(|_| Error::EmptyCharset {
            name: A::display(name),
        })
    }

    /// Walk `body` left to right, splicing in referenced definitions.
    ///
    /// `history` records the names substituted on the path to this body;
    /// each occurrence of a name consumes one earlier definition of it, and
    /// running out of definitions is fatal. That bound also bounds the
    /// recursion depth.
    fn expand_body(&self, body: &[A::Cp], history: &mut Vec<A::Cp>) -> Result<Vec<A::Cp>> {
        let esc = A::ascii(b'?');
        let comma = A::ascii(b',');
        let mut out = Vec::with_capacity(body.len());
        let mut i = 0;
        while i < body.len() {
            let c = body[i];
            if c != esc {
                out.push(c);
                i += 1;
                continue;
            }
            if i + 1 == body.len() {
                // trailing lone escape stands for itself
                out.push(esc);
                break;
            }
            let key = body[i + 1];
            i += 2;
            if key == esc || key == comma {
                out.push(key);
                continue;
            }

            let defs = match self.defs.get(&key) {
                Some(defs) if !defs.is_empty() => defs,
                _ => {
                    return Err(Error::UnknownCharset {
                        name: A::display(key),
                    })
                }
            };
            let used = history.iter().filter(|&&h| h == key).count();
            if used >= defs.len() {
                return Err(Error::CharsetRecursion {
                    name: A::display(key),
                });
            }
            // the used-th definition counting back from the most recent
            let def = &defs[defs.len() - 1 - used];
            if def.resolved {
                out.extend_from_slice(&def.body);
            } else {
                history.push(key);
                let sub = self.expand_body(&def.body, history)?;
                history.pop();
                out.extend(sub);
            }
        }
        Ok(out)
    }
}

fn dedup_preserving_order<A: Alphabet>(body: Vec<A::Cp>) -> Vec<A::Cp> {
    let mut seen = std::collections::HashSet::with_capacity(body.len());
    body.into_iter().filter(|cp| seen.insert(*cp)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{Bytes, Unicode};

    fn byte_registry() -> Registry<Bytes> {
        let mut reg = Registry::<Bytes>::with_builtins();
        reg.expand_all().unwrap();
        reg
    }

    fn body_of(reg: &Registry<Bytes>, name: u8) -> Vec<u8> {
        reg.lookup(name).unwrap().body().to_vec()
    }

    #[test]
    fn builtin_a_covers_the_printable_classes() {
        let reg = byte_registry();
        let a = body_of(&reg, b'a');
        assert_eq!(a.len(), 26 + 26 + 10 + 33);
        assert_eq!(&a[..3], b"abc");
        assert!(a.contains(&b'~'));
    }

    #[test]
    fn byte_mode_has_the_full_byte_class() {
        let reg = byte_registry();
        assert_eq!(body_of(&reg, b'b').len(), 256);
        let mut uni = Registry::<Unicode>::with_builtins();
        uni.expand_all().unwrap();
        assert!(uni.lookup('b').is_none());
    }

    #[test]
    fn self_reference_uses_the_previous_definition() {
        let mut reg = byte_registry();
        reg.define(b'1', b"123".to_vec(), false);
        reg.expand(b'1').unwrap();
        reg.define(b'1', b"?1456".to_vec(), false);
        reg.expand(b'1').unwrap();
        assert_eq!(body_of(&reg, b'1'), b"123456");
    }

    #[test]
    fn builtins_can_be_extended_in_place() {
        let mut reg = byte_registry();
        reg.define(b'l', b"?l0123".to_vec(), false);
        reg.expand(b'l').unwrap();
        assert_eq!(body_of(&reg, b'l').len(), 30);
    }

    #[test]
    fn exhausted_self_reference_is_fatal() {
        let mut reg = byte_registry();
        reg.define(b'x', b"?x".to_vec(), false);
        let err = reg.expand(b'x').unwrap_err();
        assert!(matches!(err, Error::CharsetRecursion { .. }));
    }

    #[test]
    fn unknown_reference_is_fatal() {
        let mut reg = byte_registry();
        reg.define(b'1', b"?q".to_vec(), false);
        assert!(matches!(
            reg.expand(b'1').unwrap_err(),
            Error::UnknownCharset { .. }
        ));
    }

    #[test]
    fn escapes_produce_literals() {
        let mut reg = byte_registry();
        reg.define(b'1', b"a??b?,c?".to_vec(), false);
        reg.expand(b'1').unwrap();
        assert_eq!(body_of(&reg, b'1'), b"a?b,c");
    }

    #[test]
    fn expansion_dedups_preserving_first_occurrence() {
        let mut reg = byte_registry();
        reg.define(b'1', b"?d9?d".to_vec(), false);
        reg.expand(b'1').unwrap();
        assert_eq!(body_of(&reg, b'1'), b"0123456789");
    }

    #[test]
    fn expansion_is_idempotent_on_resolved_entries() {
        let mut reg = byte_registry();
        reg.define(b'1', b"?d".to_vec(), false);
        reg.expand(b'1').unwrap();
        let first = body_of(&reg, b'1');
        reg.expand(b'1').unwrap();
        assert_eq!(first, body_of(&reg, b'1'));
    }

    #[test]
    fn detached_expansion_resolves_against_visible_definitions() {
        let reg = byte_registry();
        let got = reg.expand_detached(b"x?d").unwrap();
        assert_eq!(got, b"x0123456789");
        assert!(reg.expand_detached(b"?Z").is_err());
    }

    #[test]
    fn nested_references_expand_transitively() {
        let mut reg = byte_registry();
        reg.define(b'1', b"ab".to_vec(), false);
        reg.expand(b'1').unwrap();
        reg.define(b'2', b"?1c".to_vec(), false);
        reg.expand(b'2').unwrap();
        assert_eq!(body_of(&reg, b'2'), b"abc");
    }
}
