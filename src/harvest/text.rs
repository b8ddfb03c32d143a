/// Zero-width and invisible formatting characters
fn is_invisible(ch: char) -> bool {
    matches!(
        ch,
        '\u{00AD}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{2069}'
            | '\u{FEFF}'
    )
}

/// Normalize harvested text.
///
/// Invisible characters go first so that removing them can never leave behind
/// an empty line or a double space; that ordering is what makes the transform a
/// fixed point on its own output. Lines are trimmed, blank lines (and with them
/// any run of three or more newlines) disappear, and interior runs of two or
/// more horizontal whitespace characters become a single space.
pub fn clean_text(raw: &str) -> String {
    let visible: String = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| !is_invisible(*c))
        .collect();

    visible
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(collapse_horizontal_whitespace)
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_horizontal_whitespace(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut run: Option<char> = None;
    let mut run_len = 0usize;

    let flush = |out: &mut String, run: Option<char>, run_len: usize| {
        if let Some(ch) = run {
            if run_len >= 2 {
                out.push(' ');
            } else {
                out.push(ch);
            }
        }
    };

    for ch in line.chars() {
        if ch.is_whitespace() {
            if run.is_none() {
                run = Some(ch);
            }
            run_len += 1;
        } else {
            flush(&mut out, run.take(), run_len);
            run_len = 0;
            out.push(ch);
        }
    }
    flush(&mut out, run, run_len);
    out
}
