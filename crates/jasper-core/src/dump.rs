//! Human-readable graph dump.
//!
//! ```text
//! graph(%input : F32(1, 3, 8, 8),
//!       %conv.weight : F32(16, 3, 3, 3)):
//!   %y : F32(1, 16, 6, 6) = Conv[strides=[1, 1]](%input, %conv.weight)
//!   return (%y)
//! ```

use crate::ir::{BlockId, Graph, ValueId};
use std::fmt::{self, Write};

impl Graph {
    fn value_ref(&self, id: ValueId) -> String {
        match self.value(id) {
            Ok(value) => format!("%{}", value.name()),
            Err(_) => format!("%<dead:{}>", id.0),
        }
    }

    fn value_decl(&self, id: ValueId) -> String {
        match self.value(id).ok().and_then(|v| v.ty()) {
            Some(ty) => format!("{} : {}", self.value_ref(id), ty),
            None => self.value_ref(id),
        }
    }

    fn value_list(&self, ids: &[ValueId], decl: bool) -> String {
        ids.iter()
            .map(|&id| if decl { self.value_decl(id) } else { self.value_ref(id) })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn fmt_block(&self, out: &mut String, block: BlockId, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        let nodes = self.block(block).map_err(|_| fmt::Error)?.nodes();

        for &id in nodes {
            let node = self.node(id).map_err(|_| fmt::Error)?;
            out.push_str(&indent);
            if !node.outputs().is_empty() {
                write!(out, "{} = ", self.value_list(node.outputs(), true))?;
            }
            out.push_str(node.kind());
            if !node.attributes.is_empty() {
                let attrs: Vec<String> = node
                    .attributes
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect();
                write!(out, "[{}]", attrs.join(", "))?;
            }
            writeln!(out, "({})", self.value_list(node.inputs(), false))?;

            for (i, &child) in node.blocks().iter().enumerate() {
                let inputs = self.block_inputs(child).map_err(|_| fmt::Error)?;
                writeln!(out, "{indent}  block{i}({}):", self.value_list(inputs, true))?;
                self.fmt_block(out, child, depth + 2)?;
                let outputs = self.block_outputs(child).map_err(|_| fmt::Error)?;
                writeln!(out, "{indent}    -> ({})", self.value_list(outputs, false))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        let inputs: Vec<String> = self.inputs().iter().map(|&id| self.value_decl(id)).collect();
        writeln!(out, "graph({}):", inputs.join(",\n      "))?;
        self.fmt_block(&mut out, self.root(), 1)?;
        writeln!(out, "  return ({})", self.value_list(self.outputs(), false))?;
        f.write_str(&out)
    }
}
