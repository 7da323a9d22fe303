//! Emission context shared by the visitors of a generator.
//!
//! The meaning of "emit this expression" depends on where it sits: inside
//! `$(( ))` variables must not be quoted, a call used as a value needs
//! `$( )`, operands of `&&` must not be turned into `0`/`1` text on their
//! own, and so on. Those settings live in [`Flags`] and are only changed
//! through a [`Scoped`] guard so they cannot leak into siblings.

use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    /// Emit `"$x"` rather than `$x`.
    pub quote_variable: bool,
    /// Wrap calls, external commands and pipelines in `$( )`.
    pub functioncall_wrap: bool,
    /// Turn comparisons into `$([[ .. ]] && echo 1 || echo 0)`.
    pub comparison_wrap: bool,
    /// Print `{` / `}` around the next block.
    pub block_braces: bool,
    pub indent: usize,
}

impl Default for Flags {
    fn default() -> Self {
        Flags {
            quote_variable: true,
            functioncall_wrap: false,
            comparison_wrap: true,
            block_braces: true,
            indent: 0,
        }
    }
}

/// Anything that owns a [`Flags`] value can hand out scoped changes to it.
pub trait EmitState: Sized {
    fn flags(&self) -> &Flags;
    fn flags_mut(&mut self) -> &mut Flags;

    fn scoped(&mut self, change: impl FnOnce(&mut Flags)) -> Scoped<'_, Self> {
        let saved = *self.flags();
        change(self.flags_mut());
        Scoped { state: self, saved }
    }

    fn quoting(&mut self, on: bool) -> Scoped<'_, Self> {
        self.scoped(|f| f.quote_variable = on)
    }

    fn call_wrap(&mut self, on: bool) -> Scoped<'_, Self> {
        self.scoped(|f| f.functioncall_wrap = on)
    }

    fn comparison_wrap(&mut self, on: bool) -> Scoped<'_, Self> {
        self.scoped(|f| f.comparison_wrap = on)
    }

    fn block_braces(&mut self, on: bool) -> Scoped<'_, Self> {
        self.scoped(|f| f.block_braces = on)
    }

    fn indented(&mut self) -> Scoped<'_, Self> {
        self.scoped(|f| f.indent += 1)
    }
}

/// Restores the flags it was created from when dropped, including when a
/// visitor returns early through `?`.
pub struct Scoped<'s, S: EmitState> {
    state: &'s mut S,
    saved: Flags,
}

impl<S: EmitState> Deref for Scoped<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.state
    }
}

impl<S: EmitState> DerefMut for Scoped<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.state
    }
}

impl<S: EmitState> Drop for Scoped<'_, S> {
    fn drop(&mut self) {
        *self.state.flags_mut() = self.saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        flags: Flags,
    }

    impl EmitState for Probe {
        fn flags(&self) -> &Flags {
            &self.flags
        }

        fn flags_mut(&mut self) -> &mut Flags {
            &mut self.flags
        }
    }

    #[test]
    fn guard_restores_on_drop() {
        let mut p = Probe::default();
        {
            let g = p.quoting(false);
            assert!(!g.flags.quote_variable);
        }
        assert_eq!(p.flags, Flags::default());
    }

    #[test]
    fn chained_guards_unwind_in_order() {
        let mut p = Probe::default();
        {
            let mut outer = p.call_wrap(true);
            {
                let inner = outer.comparison_wrap(false);
                assert!(inner.flags.functioncall_wrap);
                assert!(!inner.flags.comparison_wrap);
            }
            assert!(outer.flags.functioncall_wrap);
            assert!(outer.flags.comparison_wrap);
        }
        assert_eq!(p.flags, Flags::default());
    }

    #[test]
    fn guard_restores_after_early_error() {
        fn fails(p: &mut Probe) -> Result<(), ()> {
            let mut g = p.indented();
            let _g2 = g.block_braces(false);
            Err(())
        }
        let mut p = Probe::default();
        assert!(fails(&mut p).is_err());
        assert_eq!(p.flags, Flags::default());
    }
}
