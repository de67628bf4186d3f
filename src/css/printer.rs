use super::node::{Decl, Node};

pub fn to_css(nodes: &[Node], minify: bool) -> String {
    let mut out = String::new();
    for (idx, node) in nodes.iter().enumerate() {
        if idx > 0 && !minify {
            out.push('\n');
        }
        write_node(&mut out, node, 0, minify);
    }
    out
}

fn write_node(out: &mut String, node: &Node, depth: usize, minify: bool) {
    match node {
        Node::Rule(rule) => {
            indent(out, depth, minify);
            out.push_str(&selector_text(&rule.selector, minify));
            write_block(out, &rule.nodes, depth, minify);
        }
        Node::AtRule(at) => {
            indent(out, depth, minify);
            out.push('@');
            out.push_str(&at.name);
            if !at.params.is_empty() {
                out.push(' ');
                out.push_str(at.params.trim());
            }
            match &at.nodes {
                Some(nodes) => write_block(out, nodes, depth, minify),
                None => {
                    out.push(';');
                    if !minify {
                        out.push('\n');
                    }
                }
            }
        }
        Node::Decl(decl) => {
            indent(out, depth, minify);
            write_decl(out, decl, minify);
        }
        Node::Comment(text) => {
            if minify && !text.starts_with('!') {
                return;
            }
            indent(out, depth, minify);
            out.push_str("/*");
            out.push_str(text);
            out.push_str("*/");
            if !minify {
                out.push('\n');
            }
        }
    }
}

fn write_block(out: &mut String, nodes: &[Node], depth: usize, minify: bool) {
    if minify {
        out.push('{');
        for (idx, node) in nodes.iter().enumerate() {
            write_node(out, node, depth + 1, true);
            if matches!(node, Node::Decl(_)) && idx + 1 < nodes.len() {
                out.push(';');
            }
        }
        out.push('}');
        return;
    }

    out.push_str(" {\n");
    for node in nodes {
        write_node(out, node, depth + 1, false);
    }
    indent(out, depth, false);
    out.push_str("}\n");
}

fn write_decl(out: &mut String, decl: &Decl, minify: bool) {
    out.push_str(&decl.prop);
    out.push(':');
    if !minify {
        out.push(' ');
    }
    out.push_str(decl.value.trim());
    if decl.important {
        out.push_str(if minify { "!important" } else { " !important" });
    }
    if !minify {
        out.push_str(";\n");
    }
}

fn selector_text(selector: &str, minify: bool) -> String {
    let branches = crate::selector::split_top_level_commas(selector);
    if minify {
        branches.join(",")
    } else {
        branches.join(", ")
    }
}

fn indent(out: &mut String, depth: usize, minify: bool) {
    if minify {
        return;
    }
    for _ in 0..depth {
        out.push_str("  ");
    }
}

#[cfg(test)]
mod tests {
    use super::to_css;
    use crate::css::node::Node;
    use pretty_assertions::assert_eq;

    #[test]
    fn prints_nested_media_rule() {
        let node = Node::rule(".md\\:font-bold", vec![Node::decl("font-weight", "700")])
            .wrap("media", "(min-width: 768px)");
        assert_eq!(
            to_css(&[node], false),
            "@media (min-width: 768px) {\n  .md\\:font-bold {\n    font-weight: 700;\n  }\n}\n"
        );
    }

    #[test]
    fn prints_minified_rules() {
        let nodes = vec![
            Node::rule(
                ".a, .b",
                vec![Node::decl("color", "red"), Node::decl("margin", "0")],
            ),
            Node::statement("import", "\"x.css\""),
        ];
        assert_eq!(to_css(&nodes, true), ".a,.b{color:red;margin:0}@import \"x.css\";");
    }

    #[test]
    fn prints_important_declarations() {
        let node = Node::rule(".a", vec![Node::decl("color", "red")]).with_important(true);
        assert_eq!(to_css(&[node], false), ".a {\n  color: red !important;\n}\n");
    }
}
