//! Debug instrumentation: labelled values attached to elements, evaluated
//! lazily when the tree is inspected.

use std::fmt::Write as _;

use crate::element::{ElementId, ElementTree};
use crate::error::HookError;

pub(crate) struct DebugEntry {
    label: String,
    format: Box<dyn Fn() -> String>,
}

/// Attach a labelled debug value to element `id`.
///
/// `formatter` runs only when the element is inspected, never on the hot
/// path.
pub fn use_debug_value(
    tree: &mut ElementTree,
    id: ElementId,
    label: impl Into<String>,
    formatter: impl Fn() -> String + 'static,
) -> Result<(), HookError> {
    if !tree.contains(id) {
        return Err(HookError::UnknownElement(id));
    }
    let entry = DebugEntry {
        label: label.into(),
        format: Box::new(formatter),
    };
    tree.debug
        .entry(id)
        .map(|slot| slot.or_default().push(entry))
        .ok_or(HookError::UnknownElement(id))
}

impl ElementTree {
    /// Current `(label, value)` pairs for an element, in registration order.
    pub fn inspect(&self, id: ElementId) -> Vec<(String, String)> {
        self.debug
            .get(id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| (entry.label.clone(), (entry.format)()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Indented dump of the tree under the root: one line per element with
    /// its mount state and debug values.
    ///
    /// ```text
    /// App [mounted]
    ///   PokemonInfo [mounted] pokemon=resolved
    /// ```
    pub fn debug_dump(&self) -> String {
        let Some(root) = self.root() else {
            return String::new();
        };
        let base = self.ancestors(root).len();
        let mut out = String::new();
        for id in self.subtree(root) {
            let depth = self.ancestors(id).len() - base;
            let state = if self.is_mounted(id) { "mounted" } else { "detached" };
            let _ = write!(out, "{}{} [{state}]", "  ".repeat(depth), self.name(id));
            for (label, value) in self.inspect(id) {
                let _ = write!(out, " {label}={value}");
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn inspect_evaluates_lazily() {
        let mut tree = ElementTree::new();
        let app = tree.insert("App");
        let calls = Rc::new(Cell::new(0));
        let calls_c = calls.clone();
        use_debug_value(&mut tree, app, "renders", move || {
            calls_c.set(calls_c.get() + 1);
            calls_c.get().to_string()
        })
        .unwrap();

        assert_eq!(calls.get(), 0);
        assert_eq!(tree.inspect(app), vec![("renders".to_owned(), "1".to_owned())]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn debug_dump_indents_and_lists_values() {
        let mut tree = ElementTree::new();
        let app = tree.insert("App");
        let form = tree.insert_child(app, "SearchForm").unwrap();
        let info = tree.insert_child(app, "Info").unwrap();
        tree.mount(app).unwrap();
        tree.unmount(info).unwrap();
        use_debug_value(&mut tree, form, "query", || "\"pikachu\"".to_owned()).unwrap();
        use_debug_value(&mut tree, form, "dirty", || "false".to_owned()).unwrap();

        assert_eq!(
            tree.debug_dump(),
            "App [mounted]\n  SearchForm [mounted] query=\"pikachu\" dirty=false\n  Info [detached]\n"
        );
    }

    #[test]
    fn empty_tree_dumps_nothing() {
        assert_eq!(ElementTree::new().debug_dump(), "");
    }

    #[test]
    fn unknown_element_rejected() {
        let mut tree = ElementTree::new();
        let app = tree.insert("App");
        tree.remove(app);
        assert_eq!(
            use_debug_value(&mut tree, app, "x", String::new),
            Err(HookError::UnknownElement(app))
        );
    }
}
