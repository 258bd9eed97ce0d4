use std::{collections::BTreeMap, fmt::Display};

use crate::{BackPropagator, Error, Graph};

// -----------------------------------------------------------------------------
// _Row
// -----------------------------------------------------------------------------
/// One slot of the tree as it is drawn.
#[derive(Debug, Clone)]
pub(crate) struct _Row {
    pub(crate) id: usize,
    pub(crate) label: String,
    pub(crate) leaf: bool,
    pub(crate) value: f64,
    // input derivatives whose latest factor is this slot
    pub(crate) derivatives: Vec<(String, f64)>,
}

// -----------------------------------------------------------------------------
// GraphvizBuilder
// -----------------------------------------------------------------------------
/// DOT rendering of a [crate::CalcTree] and, optionally, of the results of a
/// [BackPropagator] built on it.
///
/// Slots are drawn as records `{label|value|derivatives..}` with leaves boxed
/// and operations rounded. Every number goes through the formatter given to
/// [GraphvizBuilder::render].
#[derive(Debug, Clone)]
pub struct GraphvizBuilder<K> {
    graph: Graph<K>,
    name: String,
    rows: Vec<_Row>,
    edges: Vec<(usize, usize, Option<&'static str>)>,
    attrs: BTreeMap<String, String>,
}

//
// ctor
//
impl<K> GraphvizBuilder<K> {
    #[inline]
    pub(crate) fn new(
        graph: Graph<K>,
        rows: Vec<_Row>,
        edges: Vec<(usize, usize, Option<&'static str>)>,
    ) -> Self {
        Self {
            graph,
            name: "CalcTree".to_string(),
            rows,
            edges,
            attrs: BTreeMap::new(),
        }
    }
}

//
// methods
//
impl<K> GraphvizBuilder<K> {
    #[inline]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Graph level attribute such as `rankdir`.
    #[inline]
    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_string(), value.to_string());
        self
    }

    /// Attach the input derivatives of `bp` to the slots they end on.
    ///
    /// `bp` should have been run on the tree this builder comes from.
    pub fn with_derivatives(mut self, bp: &BackPropagator<K>) -> Result<Self, Error<K>>
    where
        K: Display,
    {
        let positions: BTreeMap<_, _> = self
            .rows
            .iter()
            .enumerate()
            .map(|(pos, row)| (row.id, pos))
            .collect();
        for (op, value) in bp.collect() {
            if !Graph::ptr_eq(op.graph(), &self.graph) {
                return Err(Error::DifferentGraphs("graphviz annotation"));
            }
            let last = op
                .monomial()
                .factors()
                .iter()
                .map(|(id, _)| positions.get(id).copied())
                .collect::<Option<Vec<_>>>()
                .and_then(|pos| pos.into_iter().max());
            match last {
                Some(pos) => self.rows[pos].derivatives.push((op.to_string(), value)),
                None => return Err(Error::NotInTree(op.to_string())),
            }
        }
        Ok(self)
    }

    /// Generate the DOT source.
    pub fn render<F>(&self, fmt: F) -> String
    where
        F: Fn(f64) -> String,
    {
        let mut buf = format!("digraph {} {{\n", self.name);
        for (key, value) in &self.attrs {
            buf += &format!("  {key}={value};\n");
        }
        for (pos, row) in self.rows.iter().enumerate() {
            let mut fields = vec![_escape(&row.label), _escape(&fmt(row.value))];
            fields.extend(
                row.derivatives
                    .iter()
                    .map(|(op, v)| _escape(&format!("{op}={}", fmt(*v)))),
            );
            let shape = if row.leaf { "record" } else { "Mrecord" };
            buf += &format!(
                "  n{pos} [shape={shape}, label=\"{{{}}}\"];\n",
                fields.join("|")
            );
        }
        for (src, dst, side) in &self.edges {
            match side {
                Some(side) => buf += &format!("  n{src} -> n{dst} [label={side}];\n"),
                None => buf += &format!("  n{src} -> n{dst};\n"),
            }
        }
        buf += "}\n";
        buf
    }
}

// record labels reserve braces, bars and angle brackets
fn _escape(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '{' | '}' | '|' | '<' | '>' | '"' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect()
}
