use boardcheck_core::{ItemRef, Text};

use super::DriverContext;
use crate::violation::{DrcCode, DrcViolation};

/// Variables a footprint resolves for its own texts.
const FOOTPRINT_VARIABLES: [&str; 2] = ["REFERENCE", "VALUE"];

/// Names of all `${NAME}` references in `text`, in order of appearance.
/// An unterminated `${` is literal text.
pub(crate) fn variable_references(text: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        names.push(&after[..end]);
        rest = &after[end + 1..];
    }
    names
}

pub(super) fn run(ctx: &mut DriverContext<'_>) {
    let board = ctx.board;
    let mut texts: Vec<(ItemRef, &Text, bool)> = board
        .texts
        .iter()
        .enumerate()
        .map(|(index, t)| (ItemRef::Text { index }, t, false))
        .collect();
    for (fi, fp) in board.footprints.iter().enumerate() {
        texts.extend(
            fp.texts
                .iter()
                .enumerate()
                .map(|(index, t)| (ItemRef::FootprintText { footprint: fi, index }, t, true)),
        );
    }

    let total = texts.len();
    for (i, (item, text, in_footprint)) in texts.into_iter().enumerate() {
        if !ctx.step(i, total) {
            return;
        }
        let unresolved: Vec<&str> = variable_references(&text.text)
            .into_iter()
            .filter(|name| !board.text_vars.contains_key(*name))
            .filter(|name| !(in_footprint && FOOTPRINT_VARIABLES.contains(name)))
            .collect();
        if unresolved.is_empty() {
            continue;
        }
        ctx.report(
            DrcViolation::new(DrcCode::UnresolvedVariable, text.position)
                .with_item(item)
                .with_detail(format!("'{}'", unresolved.join("', '"))),
        );
    }
}
