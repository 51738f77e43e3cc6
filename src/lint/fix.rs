use super::{SqlSource, Violation, format_sql};
use crate::error::AppResult;

/// Apply the fixes attached to `violations` to `text`.
///
/// Edits are applied back to front; an edit overlapping one already
/// applied is skipped.
pub fn apply_fixes(text: &str, violations: &[Violation]) -> String {
    let mut fixes: Vec<_> = violations.iter().filter_map(|v| v.fix.as_ref()).collect();
    fixes.sort_by(|a, b| b.range.start.cmp(&a.range.start));
    let mut out = text.to_string();
    let mut floor = usize::MAX;
    for fix in fixes {
        if fix.range.end > floor || fix.range.end > out.len() {
            continue;
        }
        out.replace_range(fix.range.clone(), &fix.replacement);
        floor = fix.range.start;
    }
    out
}

/// Apply the source's fixes, then reformat the result
pub fn fix_source(source: &SqlSource, violations: &[Violation]) -> AppResult<String> {
    let fixed = apply_fixes(source.text(), violations);
    let reparsed = SqlSource::parse(&fixed, source.name())?;
    Ok(format_sql(&reparsed))
}
