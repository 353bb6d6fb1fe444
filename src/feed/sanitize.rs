use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node};

/// Heading levels rewritten to a single uniform `<h4>`.
///
/// Entry bodies are nested under the digest's own section and feed
/// headings, so anything louder than `<h4>` breaks the document outline
/// on the reading device.
const DEMOTED_HEADINGS: [&str; 3] = ["h1", "h2", "h3"];

/// Elements removed entirely, together with their content.
///
/// Images are not viewable on the target device; scripts and embedded
/// vector/object/plugin content must never reach the rendered document.
const DROPPED_ELEMENTS: [&str; 5] = ["script", "img", "svg", "object", "embed"];

/// Font-styling elements unwrapped to their content.
const UNWRAPPED_ELEMENTS: [&str; 1] = ["font"];

/// Void elements serialized without a closing tag.
const VOID_ELEMENTS: [&str; 12] = [
    "area", "base", "br", "col", "hr", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Sanitizes an HTML fragment for the constrained reading device.
///
/// Rewrites `h1`/`h2`/`h3` into `<h4>` preserving their text, unwraps
/// `<font>` keeping inner text and markup, and removes `<script>`,
/// `<img>`, `<svg>`, `<object>` and `<embed>` entirely. All other
/// markup passes through unchanged.
///
/// Idempotent: running the output through again yields byte-identical
/// text, so content that arrives pre-sanitized is not mangled further.
pub fn sanitize_fragment(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    for child in fragment.root_element().children() {
        write_node(child, &mut out);
    }
    out
}

fn write_node(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            out.push_str(&html_escape::encode_text(&*text.text));
        }
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(&*comment.comment);
            out.push_str("-->");
        }
        Node::Element(element) => write_element(node, &element, out),
        // Doctypes and processing instructions have no place in a fragment
        _ => {}
    }
}

fn write_element(node: NodeRef<'_, Node>, element: &Element, out: &mut String) {
    let name = element.name();

    if DROPPED_ELEMENTS.contains(&name) {
        return;
    }

    if DEMOTED_HEADINGS.contains(&name) {
        out.push_str("<h4>");
        if let Some(heading) = ElementRef::wrap(node) {
            let text: String = heading.text().collect();
            out.push_str(&html_escape::encode_text(&text));
        }
        out.push_str("</h4>");
        return;
    }

    if UNWRAPPED_ELEMENTS.contains(&name) {
        for child in node.children() {
            write_node(child, out);
        }
        return;
    }

    out.push('<');
    out.push_str(name);
    for (key, value) in element.attrs() {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    for child in node.children() {
        write_node(child, out);
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}
