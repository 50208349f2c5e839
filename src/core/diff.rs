//! Minimal-difference computation between option trees.
//!
//! [`diff`] keeps only what a user changed relative to a style's defaults,
//! which is what the export surfaces hand out. [`merge`] goes the other way
//! and lays a diff back over the defaults.

use crate::core::options::{OptionValue, OptionsTree};

/// Difference of `current` against `default`, or `None` when nothing differs.
///
/// Blank values (`null` and the empty string) never count as a difference,
/// even when the default is set: exported options stay free of explicit
/// blanks. Lists compare as a whole. Trees recurse per key of `current`;
/// keys only present in `default` are ignored and a tree without surviving
/// keys collapses to `None`.
pub fn diff(current: &OptionValue, default: Option<&OptionValue>) -> Option<OptionValue> {
    if current.is_blank() {
        return None;
    }
    match current {
        OptionValue::Tree(tree) => {
            let empty = OptionsTree::new();
            let defaults = default.and_then(OptionValue::as_tree).unwrap_or(&empty);
            diff_tree(tree, defaults).map(OptionValue::Tree)
        }
        OptionValue::List(items) => match default {
            Some(OptionValue::List(default_items)) if lists_equal(items, default_items) => None,
            _ => Some(current.clone()),
        },
        primitive => {
            if default == Some(primitive) {
                None
            } else {
                Some(primitive.clone())
            }
        }
    }
}

/// [`diff`] specialised to trees.
pub fn diff_tree(current: &OptionsTree, default: &OptionsTree) -> Option<OptionsTree> {
    let mut result = OptionsTree::new();
    for (key, value) in current.iter() {
        if let Some(changed) = diff(value, default.get(key)) {
            result.insert(key, changed);
        }
    }
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Serialized equality: order and type sensitive.
fn lists_equal(a: &[OptionValue], b: &[OptionValue]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x.to_json() == y.to_json())
}

/// Deep-merge `overlay` onto a copy of `base`.
///
/// Trees merge per key; every other value in `overlay` replaces the one in
/// `base`. `merge(default, &diff_tree(current, default))` reconstructs
/// `current` for trees that share `default`'s shape and hold no blanks.
pub fn merge(base: &OptionsTree, overlay: &OptionsTree) -> OptionsTree {
    let mut merged = base.clone();
    for (key, value) in overlay.iter() {
        let combined = match (merged.get(key), value) {
            (Some(OptionValue::Tree(base_tree)), OptionValue::Tree(overlay_tree)) => {
                OptionValue::Tree(merge(base_tree, overlay_tree))
            }
            _ => value.clone(),
        };
        merged.insert(key, combined);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options_tree;

    #[test]
    fn test_removes_identical_properties() {
        let current = options_tree! {
            "a" => 1.0,
            "b" => 2.0,
            "c" => options_tree! {
                "d" => 3.0,
                "e" => 4.0,
                "f" => options_tree! { "g" => 5.0, "h" => 6.0 },
            },
            "i" => 7.0,
        };
        let defaults = options_tree! {
            "a" => 1.0,
            "b" => 20.0,
            "c" => options_tree! {
                "d" => 3.0,
                "e" => 40.0,
                "f" => options_tree! { "g" => 50.0, "h" => 6.0 },
            },
            "i" => 70.0,
        };
        let expected = options_tree! {
            "b" => 2.0,
            "c" => options_tree! { "e" => 4.0, "f" => options_tree! { "g" => 5.0 } },
            "i" => 7.0,
        };

        assert_eq!(diff_tree(&current, &defaults), Some(expected));
    }

    #[test]
    fn test_identical_trees_have_no_difference() {
        let tree = options_tree! {
            "language" => "de",
            "tiles" => vec!["https://example.org"],
            "recolor" => options_tree! { "rotate" => 0.0, "invertBrightness" => false },
        };
        assert_eq!(diff_tree(&tree, &tree), None);
    }

    #[test]
    fn test_blank_current_is_never_a_difference() {
        let defaults = options_tree! { "language" => "de", "colors" => options_tree! { "water" => "#bef" } };

        let emptied = options_tree! { "language" => "" };
        assert_eq!(diff_tree(&emptied, &defaults), None);

        let nulled = options_tree! { "language" => OptionValue::Null };
        assert_eq!(diff_tree(&nulled, &defaults), None);

        let removed = options_tree! { "colors" => OptionsTree::new() };
        assert_eq!(diff_tree(&removed, &defaults), None);
    }

    #[test]
    fn test_lists_compare_wholesale() {
        let defaults = options_tree! { "tiles" => vec!["a", "b"] };

        let reordered = options_tree! { "tiles" => vec!["b", "a"] };
        assert_eq!(diff_tree(&reordered, &defaults), Some(reordered.clone()));

        let retyped = options_tree! { "tiles" => vec![OptionValue::from(1.0), OptionValue::from("b")] };
        assert_eq!(diff_tree(&retyped, &defaults), Some(retyped.clone()));

        let same = options_tree! { "tiles" => vec!["a", "b"] };
        assert_eq!(diff_tree(&same, &defaults), None);
    }

    #[test]
    fn test_new_keys_and_shape_mismatch() {
        let defaults = options_tree! { "recolor" => "off" };
        let current = options_tree! {
            "baseUrl" => "https://example.org",
            "recolor" => options_tree! { "rotate" => 12.0 },
        };
        assert_eq!(diff_tree(&current, &defaults), Some(current.clone()));
    }

    #[test]
    fn test_false_matching_default_is_dropped() {
        let defaults = options_tree! { "recolor" => options_tree! { "invertBrightness" => false } };
        let current = defaults.clone();
        assert_eq!(diff_tree(&current, &defaults), None);

        let toggled = options_tree! { "recolor" => options_tree! { "invertBrightness" => true } };
        assert_eq!(diff_tree(&toggled, &defaults), Some(toggled.clone()));
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let defaults = options_tree! { "a" => 1.0, "b" => options_tree! { "c" => 2.0 } };
        let current = options_tree! { "a" => 5.0, "b" => options_tree! { "c" => 2.0 } };
        let (before_current, before_defaults) = (current.clone(), defaults.clone());
        let _ = diff_tree(&current, &defaults);
        assert_eq!(current, before_current);
        assert_eq!(defaults, before_defaults);
    }

    #[test]
    fn test_merge_reconstructs_current() {
        let defaults = options_tree! {
            "language" => "en",
            "colors" => options_tree! { "water" => "#bef", "land" => "#f9f4ee" },
            "recolor" => options_tree! { "rotate" => 0.0, "tint" => 0.0 },
        };
        let current = options_tree! {
            "language" => "de",
            "colors" => options_tree! { "water" => "#00f", "land" => "#f9f4ee" },
            "recolor" => options_tree! { "rotate" => 0.0, "tint" => 0.5 },
        };

        let delta = diff_tree(&current, &defaults).unwrap();
        assert_eq!(merge(&defaults, &delta), current);
        assert_eq!(merge(&defaults, &OptionsTree::new()), defaults);
    }
}
