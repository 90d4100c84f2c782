//! Tags are stored in a single text column. A tag is written as-is except
//! that `,` and `\` are prefixed with `\`; tags are joined with `,`. The empty
//! string is the empty list.

const SEPARATOR: char = ',';
const ESCAPE: char = '\\';

pub fn join(tags: &[String]) -> String {
    let mut out = String::new();
    for (i, tag) in tags.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        for c in tag.chars() {
            if c == SEPARATOR || c == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(c);
        }
    }
    out
}

pub fn split(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }

    let mut tags = Vec::new();
    let mut current = String::new();
    let mut chars = stored.chars();
    while let Some(c) = chars.next() {
        match c {
            ESCAPE => {
                // A trailing lone escape is kept literally.
                current.push(chars.next().unwrap_or(ESCAPE));
            }
            SEPARATOR => tags.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    tags.push(current);
    tags
}
