//! Multi-valued columns

use regex::Regex;

use crate::import::reader::Row;

/// Compiled `pattern -> replacement` rewrite
#[derive(Debug, Clone)]
pub struct CompiledSubstitution {
    pub pattern: Regex,
    pub replacement: String,
}

/// Gather every cell under `column`, split each on `separator`, rewrite,
/// trim and drop blanks, keeping the first occurrence of each item
pub fn collect_values(
    row: &Row,
    column: &str,
    separator: &str,
    substitutions: &[CompiledSubstitution],
) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();

    for text in row.get_all(column).filter_map(|c| c.as_text()) {
        let pieces: Vec<&str> = if separator.is_empty() {
            vec![text.as_str()]
        } else {
            text.split(separator).collect()
        };

        for piece in pieces {
            let mut item = piece.trim().to_string();
            for sub in substitutions {
                item = sub
                    .pattern
                    .replace_all(&item, sub.replacement.as_str())
                    .into_owned();
            }
            let item = item.trim();
            if !item.is_empty() && !items.iter().any(|existing| existing == item) {
                items.push(item.to_string());
            }
        }
    }

    items
}
