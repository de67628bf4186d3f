use super::decoration::default_ring_color;
use crate::css::{self, Node};
use crate::error::Result;
use crate::registry::PluginApi;

const PREFLIGHT: &str = "
*, ::before, ::after {
  box-sizing: border-box;
  border-width: 0;
  border-style: solid;
  border-color: currentColor;
}
html {
  line-height: 1.5;
  -webkit-text-size-adjust: 100%;
  tab-size: 4;
}
body {
  margin: 0;
  font-family: inherit;
  line-height: inherit;
}
hr {
  height: 0;
  color: inherit;
  border-top-width: 1px;
}
h1, h2, h3, h4, h5, h6 {
  font-size: inherit;
  font-weight: inherit;
}
a {
  color: inherit;
  text-decoration: inherit;
}
b, strong {
  font-weight: bolder;
}
button, input, optgroup, select, textarea {
  font-family: inherit;
  font-size: 100%;
  line-height: inherit;
  color: inherit;
  margin: 0;
  padding: 0;
}
button, [role=\"button\"] {
  cursor: pointer;
}
blockquote, dl, dd, h1, h2, h3, h4, h5, h6, hr, figure, p, pre {
  margin: 0;
}
ol, ul {
  list-style: none;
  margin: 0;
  padding: 0;
}
img, svg, video, canvas, audio, iframe, embed, object {
  display: block;
  vertical-align: middle;
}
img, video {
  max-width: 100%;
  height: auto;
}
[hidden] {
  display: none;
}
";

/// Element resets plus the starting values of the `--tw-*` variables that
/// ring and opacity utilities compose.
pub(super) fn preflight(api: &mut PluginApi<'_>) -> Result<()> {
    let mut nodes = css::parse(PREFLIGHT)?;

    let sans = api.theme().flat("fontFamily");
    if let Some(stack) = sans.get("sans") {
        nodes.push(Node::rule("html", vec![Node::decl("font-family", stack)]));
    }

    nodes.push(Node::rule(
        "*, ::before, ::after",
        vec![
            Node::decl("--tw-ring-inset", "var(--tw-empty,/*!*/ /*!*/)"),
            Node::decl("--tw-ring-offset-width", "0px"),
            Node::decl("--tw-ring-offset-color", "#fff"),
            Node::decl("--tw-ring-color", default_ring_color(api)),
            Node::decl("--tw-ring-offset-shadow", "0 0 #0000"),
            Node::decl("--tw-ring-shadow", "0 0 #0000"),
            Node::decl("--tw-shadow", "0 0 #0000"),
        ],
    ));

    api.add_base_nodes(nodes);
    Ok(())
}
