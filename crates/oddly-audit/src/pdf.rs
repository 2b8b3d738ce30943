//! Minimal PDF rendering for evidence packages.
//!
//! Emits a bare single-font document: one or more Letter pages of
//! monospaced text lines. Output is deterministic for the same input,
//! which keeps evidence hashes reproducible. Only the handful of PDF
//! constructs needed here are implemented.

const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;
const MARGIN: f64 = 54.0;
const FONT_SIZE: f64 = 9.0;
const LEADING: f64 = 12.0;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING) as usize;

/// Render a titled text document as PDF bytes.
pub fn render(title: &str, lines: &[String]) -> Vec<u8> {
    let pages = paginate(title, lines);
    let page_count = pages.len();

    // Object layout: 1 catalog, 2 pages root, 3 font, then for each page
    // a page object and its content stream.
    let mut objects: Vec<Vec<u8>> = Vec::with_capacity(3 + 2 * page_count);

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect();
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            page_count
        )
        .into_bytes(),
    );
    objects.push(b"<< /Type /Font /Subtype /Type1 /BaseFont /Courier >>".to_vec());

    for (i, page_lines) in pages.iter().enumerate() {
        let content = content_stream(page_lines);
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R \
                 /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> \
                 /Contents {} 0 R >>",
                5 + 2 * i
            )
            .into_bytes(),
        );
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content.as_bytes());
        stream.extend_from_slice(b"\nendstream");
        objects.push(stream);
    }

    assemble(&objects)
}

fn paginate(title: &str, lines: &[String]) -> Vec<Vec<String>> {
    let mut all = Vec::with_capacity(lines.len() + 2);
    all.push(title.to_string());
    all.push(String::new());
    all.extend(lines.iter().cloned());

    let mut pages: Vec<Vec<String>> = all
        .chunks(LINES_PER_PAGE)
        .map(|chunk| chunk.to_vec())
        .collect();
    if pages.is_empty() {
        pages.push(vec![title.to_string()]);
    }
    pages
}

fn content_stream(lines: &[String]) -> String {
    let mut out = String::new();
    out.push_str("BT\n");
    out.push_str(&format!("/F1 {FONT_SIZE} Tf\n"));
    out.push_str(&format!("{LEADING} TL\n"));
    out.push_str(&format!("{MARGIN} {} Td\n", PAGE_HEIGHT - MARGIN));
    for line in lines {
        out.push_str(&format!("({}) Tj T*\n", escape(line)));
    }
    out.push_str("ET");
    out
}

/// Escape the delimiters PDF string literals reserve.
fn escape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            // Courier in standard encoding; replace anything outside it.
            c if c.is_ascii_graphic() || c == ' ' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Lay out the object table, xref and trailer.
fn assemble(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());

    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}
