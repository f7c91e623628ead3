//! Namespace resolution - static tag-name tables.
//!
//! Which tag names live in which namespace is configuration data, not
//! logic: the tables below drive the one decision the renderer needs
//! (create namespaced or plain, address by attribute or by field). A
//! custom [`NamespaceResolver`] can replace them wholesale.

/// SVG namespace URI.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// MathML namespace URI.
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// Tag names materialized in the SVG namespace.
pub const SVG_TAG_NAMES: &[&str] = &[
    "animate",
    "animateMotion",
    "animateTransform",
    "circle",
    "clipPath",
    "defs",
    "desc",
    "ellipse",
    "feBlend",
    "feColorMatrix",
    "feComponentTransfer",
    "feComposite",
    "feConvolveMatrix",
    "feDiffuseLighting",
    "feDisplacementMap",
    "feDistantLight",
    "feDropShadow",
    "feFlood",
    "feFuncA",
    "feFuncB",
    "feFuncG",
    "feFuncR",
    "feGaussianBlur",
    "feImage",
    "feMerge",
    "feMergeNode",
    "feMorphology",
    "feOffset",
    "fePointLight",
    "feSpecularLighting",
    "feSpotLight",
    "feTile",
    "feTurbulence",
    "filter",
    "foreignObject",
    "g",
    "image",
    "line",
    "linearGradient",
    "marker",
    "mask",
    "metadata",
    "mpath",
    "path",
    "pattern",
    "polygon",
    "polyline",
    "radialGradient",
    "rect",
    "set",
    "stop",
    "svg",
    "switch",
    "symbol",
    "text",
    "textPath",
    "tspan",
    "use",
    "view",
];

/// Tag names materialized in the MathML namespace.
pub const MATHML_TAG_NAMES: &[&str] = &[
    "annotation",
    "annotation-xml",
    "maction",
    "math",
    "merror",
    "mfrac",
    "mi",
    "mmultiscripts",
    "mn",
    "mo",
    "mover",
    "mpadded",
    "mphantom",
    "mprescripts",
    "mroot",
    "mrow",
    "ms",
    "mspace",
    "msqrt",
    "mstyle",
    "msub",
    "msubsup",
    "msup",
    "mtable",
    "mtd",
    "mtext",
    "mtr",
    "munder",
    "munderover",
    "semantics",
];

/// Maps a tag identity to the namespace it must be created in, if any.
pub trait NamespaceResolver {
    fn resolve(&self, tag: &str) -> Option<&str>;
}

/// Default resolver over the SVG and MathML tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagTables;

impl NamespaceResolver for TagTables {
    fn resolve(&self, tag: &str) -> Option<&str> {
        if SVG_TAG_NAMES.contains(&tag) {
            Some(SVG_NAMESPACE)
        } else if MATHML_TAG_NAMES.contains(&tag) {
            Some(MATHML_NAMESPACE)
        } else {
            None
        }
    }
}
