/// A stylesheet node. Nodes are plain values: every transformation below
/// builds a new tree and leaves the receiver untouched, so a node shared
/// through a cache can never be modified behind another user's back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Decl(Decl),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
}

/// `nodes` is `None` for statement at-rules such as `@apply p-4;` or
/// `@tailwind base;`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    pub nodes: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decl {
    pub prop: String,
    pub value: String,
    pub important: bool,
}

impl Node {
    pub fn rule(selector: impl Into<String>, nodes: Vec<Node>) -> Self {
        Node::Rule(Rule {
            selector: selector.into(),
            nodes,
        })
    }

    pub fn at_rule(name: impl Into<String>, params: impl Into<String>, nodes: Vec<Node>) -> Self {
        Node::AtRule(AtRule {
            name: name.into(),
            params: params.into(),
            nodes: Some(nodes),
        })
    }

    pub fn statement(name: impl Into<String>, params: impl Into<String>) -> Self {
        Node::AtRule(AtRule {
            name: name.into(),
            params: params.into(),
            nodes: None,
        })
    }

    pub fn decl(prop: impl Into<String>, value: impl Into<String>) -> Self {
        Node::Decl(Decl {
            prop: prop.into(),
            value: value.into(),
            important: false,
        })
    }

    pub fn is_at_rule(&self, name: &str) -> bool {
        matches!(self, Node::AtRule(at) if at.name == name)
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Rule(rule) => &rule.nodes,
            Node::AtRule(AtRule {
                nodes: Some(nodes), ..
            }) => nodes,
            _ => &[],
        }
    }

    /// Rebuilds every style rule in the tree with `f`. Rules nested in
    /// `@keyframes` are frames, not selectors, and are kept as they are.
    pub fn map_rules(&self, f: &mut dyn FnMut(&Rule) -> Rule) -> Node {
        match self {
            Node::Rule(rule) => Node::Rule(f(rule)),
            Node::AtRule(at) if is_keyframes(&at.name) => self.clone(),
            Node::AtRule(at) => Node::AtRule(AtRule {
                name: at.name.clone(),
                params: at.params.clone(),
                nodes: at
                    .nodes
                    .as_ref()
                    .map(|nodes| nodes.iter().map(|node| node.map_rules(f)).collect()),
            }),
            _ => self.clone(),
        }
    }

    /// Rebuilds every declaration outside `@keyframes` with `f`.
    pub fn map_decls(&self, f: &mut dyn FnMut(&Decl) -> Decl) -> Node {
        match self {
            Node::Decl(decl) => Node::Decl(f(decl)),
            Node::Rule(rule) => Node::Rule(Rule {
                selector: rule.selector.clone(),
                nodes: rule.nodes.iter().map(|node| node.map_decls(f)).collect(),
            }),
            Node::AtRule(at) if is_keyframes(&at.name) => self.clone(),
            Node::AtRule(at) => Node::AtRule(AtRule {
                name: at.name.clone(),
                params: at.params.clone(),
                nodes: at
                    .nodes
                    .as_ref()
                    .map(|nodes| nodes.iter().map(|node| node.map_decls(f)).collect()),
            }),
            Node::Comment(_) => self.clone(),
        }
    }

    pub fn with_important(&self, important: bool) -> Node {
        self.map_decls(&mut |decl| Decl {
            important,
            ..decl.clone()
        })
    }

    pub fn wrap(self, name: &str, params: &str) -> Node {
        Node::at_rule(name, params, vec![self])
    }

    /// Selectors of every style rule in the tree, outside `@keyframes`.
    pub fn selectors(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_selectors(self, &mut out);
        out
    }
}

impl Rule {
    pub fn with_selector(&self, selector: String) -> Rule {
        Rule {
            selector,
            nodes: self.nodes.clone(),
        }
    }
}

fn collect_selectors<'a>(node: &'a Node, out: &mut Vec<&'a str>) {
    match node {
        Node::Rule(rule) => {
            out.push(rule.selector.as_str());
            for child in &rule.nodes {
                collect_selectors(child, out);
            }
        }
        Node::AtRule(at) if is_keyframes(&at.name) => {}
        Node::AtRule(_) => {
            for child in node.children() {
                collect_selectors(child, out);
            }
        }
        _ => {}
    }
}

pub fn is_keyframes(name: &str) -> bool {
    name == "keyframes" || name.ends_with("-keyframes")
}
