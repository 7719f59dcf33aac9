//! Selector dispatch code.
//!
//! For each method group the harness gets one Solidity block that maps a fuzzed `uint8` index to a
//! method selector and its encoded call data. Branch `i` handles `index == i`; the last method takes
//! the unconditional `else`, so every index value selects exactly one method.

use serde::Serialize;
use std::ops::Range;

use tracing::debug;
use vyper_interface::{MethodDescriptor, MethodGroups, UnsupportedType, MAX_GROUP_METHODS};

use crate::encoder::encode_type;
use crate::layout::SlotLayout;

/// Variable names one dispatch block reads and writes.
#[derive(Debug, Clone, Copy)]
pub struct DispatchNames {
    pub index_var: &'static str,
    pub selector_var: &'static str,
    pub calldata_var: &'static str,
}

pub const MUTATING_DISPATCH: DispatchNames = DispatchNames {
    index_var: "fn_sel_idx",
    selector_var: "fn_sel",
    calldata_var: "cd",
};

pub const VIEW_DISPATCH: DispatchNames = DispatchNames {
    index_var: "view_sel_idx",
    selector_var: "view_sel",
    calldata_var: "view_calldata",
};

/// Indentation of statements inside a generated helper function.
const BODY_INDENT: &str = "        ";
const BRANCH_INDENT: &str = "            ";

/// The two generated dispatch blocks of one harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchBlocks {
    pub mutating: String,
    pub view: String,
}

/// Generate the dispatch block for one group whose arguments live in `window`.
///
/// An empty group yields a block that sets empty call data, which hits the fallback (or reverts)
/// identically on both deployments.
pub fn assemble_dispatch(
    methods: &[MethodDescriptor],
    window: Range<usize>,
    names: &DispatchNames,
) -> Result<String, UnsupportedType> {
    if methods.is_empty() {
        return Ok(format!("{} = \"\";", names.calldata_var));
    }

    assert!(
        methods.len() <= MAX_GROUP_METHODS,
        "{} methods cannot be selected by a uint8 index",
        methods.len()
    );

    let mut branches = Vec::with_capacity(methods.len());
    for (i, method) in methods.iter().enumerate() {
        assert!(
            method.arity() <= window.len(),
            "`{}` takes {} arguments but its slot window holds {}",
            method.name,
            method.arity(),
            window.len()
        );

        let mut call_args = vec![names.selector_var.to_string()];
        for (j, ty) in method.param_types.iter().enumerate() {
            call_args.push(encode_type(ty, window.start + j)?.into_string());
        }

        let head = if i + 1 == methods.len() {
            "{".to_string()
        } else {
            format!("if ({} == {}) {{", names.index_var, i)
        };
        branches.push(format!(
            "{head}\n{indent}{sel} = {selector};\n{indent}{cd} = abi.encodeWithSelector({args});\n{body}}}",
            head = head,
            indent = BRANCH_INDENT,
            sel = names.selector_var,
            selector = method.selector.to_hex_literal(),
            cd = names.calldata_var,
            args = call_args.join(", "),
            body = BODY_INDENT,
        ));
    }

    Ok(format!(
        "bytes4 {};\n{}{}",
        names.selector_var,
        BODY_INDENT,
        branches.join(" else ")
    ))
}

/// Generate both dispatch blocks after checking `layout` against `groups`.
pub fn assemble_dispatch_blocks(
    groups: &MethodGroups,
    layout: &SlotLayout,
) -> Result<DispatchBlocks, UnsupportedType> {
    layout.assert_consistent(groups);
    debug!(
        mutating = groups.mutating.len(),
        view = groups.view.len(),
        total_slots = layout.total_slots,
        "assembling dispatch blocks"
    );
    Ok(DispatchBlocks {
        mutating: assemble_dispatch(&groups.mutating, layout.mutating_window(), &MUTATING_DISPATCH)?,
        view: assemble_dispatch(&groups.view, layout.view_window(), &VIEW_DISPATCH)?,
    })
}
