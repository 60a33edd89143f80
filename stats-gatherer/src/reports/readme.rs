use super::{
    CROSSOVER_END_MARKER,
    CROSSOVER_HEADING,
    END_MARKER,
    SECTION_HEADING_PREFIX,
};

/// Rewrites a README with fresh report sections.
///
/// The title line stays first and the crossover section follows it. The rest of
/// the README comes next with any previous report sections removed, and the
/// growth section goes last. Empty sections are left out.
pub fn splice_readme(readme: &str, crossovers: &str, fastest: &str) -> String {
    let (title, rest) = readme.split_once('\n').unwrap_or((readme, ""));
    let rest = remove_block(rest, CROSSOVER_HEADING, CROSSOVER_END_MARKER);
    let rest = remove_block(&rest, SECTION_HEADING_PREFIX, END_MARKER);

    let pieces: Vec<&str> = [title.trim(), crossovers.trim(), rest.trim_matches('\n'), fastest.trim()]
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .collect();
    format!("{}\n", pieces.join("\n\n"))
}

/// Removes every block running from a line starting with `heading` through
/// the next `end_marker`. A heading without an end marker is kept.
fn remove_block(text: &str, heading: &str, end_marker: &str) -> String {
    let mut text = text.to_string();
    while let Some(start) = heading_line(&text, heading) {
        let Some(end) = text[start..].find(end_marker) else {
            break;
        };
        let before = &text[..start];
        let before = before.strip_suffix('\n').unwrap_or(before);
        let after = text[start + end + end_marker.len()..].trim_start();
        text = format!("{before}\n{after}");
    }
    text
}

fn heading_line(text: &str, heading: &str) -> Option<usize> {
    text.match_indices(heading)
        .map(|(index, _)| index)
        .find(|index| *index == 0 || text[..*index].ends_with('\n'))
}
