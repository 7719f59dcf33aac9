//! Foundry test harness rendering.
//!
//! One harness per contract. It deploys the unoptimized build and one comparison build chosen by
//! the fuzzer (legacy compiler, gas-optimized or size-optimized) with the same constructor
//! arguments, requires both deployments to succeed or fail together, then sends one mutating call
//! and one view call to both and requires identical success flags and return data.

use serde::Serialize;

use vyper_interface::{MethodGroups, UnsupportedType};

use crate::compiler::OptimizationProfile;
use crate::dispatch::{assemble_dispatch_blocks, DispatchBlocks};
use crate::encoder::encode_type;
use crate::layout::SlotLayout;

/// Stands in for the legacy compiler's bytecode until the legacy patch pass runs.
pub const LEGACY_PLACEHOLDER: &str = "INSERT_039_HERE";

/// Suffix of generated harness files.
pub const HARNESS_SUFFIX: &str = ".t.sol";

/// Hex bytecode (no `0x`) of each profile compiled in the main pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileBytecodes {
    pub unoptimized: String,
    pub gas: String,
    pub codesize: String,
}

impl ProfileBytecodes {
    /// Bytecode compiled for `profile`; `None` for the legacy profile, which is patched in later.
    pub fn get(&self, profile: OptimizationProfile) -> Option<&str> {
        match profile {
            OptimizationProfile::None => Some(&self.unoptimized),
            OptimizationProfile::Gas => Some(&self.gas),
            OptimizationProfile::Codesize => Some(&self.codesize),
            OptimizationProfile::Legacy => None,
        }
    }

    /// Main-pass profiles with their bytecode, baseline first.
    pub fn iter(&self) -> impl Iterator<Item = (OptimizationProfile, &str)> + '_ {
        OptimizationProfile::MAIN
            .into_iter()
            .filter_map(move |p| self.get(p).map(|code| (p, code)))
    }
}

/// `abi.encode(...)` of the constructor arguments, or `""` when there are none.
pub fn constructor_args_expression(
    groups: &MethodGroups,
    layout: &SlotLayout,
) -> Result<String, UnsupportedType> {
    let params = groups.constructor_params();
    if params.is_empty() {
        return Ok("\"\"".to_string());
    }
    let start = layout.constructor_window().start;
    let args = params
        .iter()
        .enumerate()
        .map(|(i, ty)| encode_type(ty, start + i).map(|e| e.into_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("abi.encode({})", args.join(", ")))
}

/// Everything a harness is rendered from.
#[derive(Debug, Clone)]
pub struct HarnessParts<'a> {
    pub name: &'a str,
    pub bytecodes: &'a ProfileBytecodes,
    pub layout: SlotLayout,
    pub constructor_args: String,
    pub dispatch: DispatchBlocks,
}

/// Solidity source of one harness and the layout it was planned with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedHarness {
    pub text: String,
    pub layout: SlotLayout,
}

/// Plan, encode and render the harness for a contract named `name` (already in test-name form).
pub fn emit_harness(
    name: &str,
    bytecodes: &ProfileBytecodes,
    groups: &MethodGroups,
) -> Result<RenderedHarness, UnsupportedType> {
    let layout = SlotLayout::plan(groups);
    let constructor_args = constructor_args_expression(groups, &layout)?;
    let dispatch = assemble_dispatch_blocks(groups, &layout)?;
    let text = render_harness(&HarnessParts {
        name,
        bytecodes,
        layout,
        constructor_args,
        dispatch,
    });
    Ok(RenderedHarness { text, layout })
}

pub fn render_harness(parts: &HarnessParts<'_>) -> String {
    let name = parts.name;
    let total = parts.layout.total_slots;
    let bc = parts.bytecodes;

    let mut out = String::with_capacity(
        bc.unoptimized.len() + bc.gas.len() + bc.codesize.len() + 4096,
    );
    out.push_str("// SPDX-License-Identifier: MIT\n");
    out.push_str("pragma solidity ^0.8.0;\n\n");
    out.push_str("import { Test, console2 } from \"forge-std/Test.sol\";\n\n");
    out.push_str(&format!("contract {}Test is Test {{\n", name));

    out.push_str(&format!(
        "    function testFormal__{name}(uint256[{total}] calldata args, uint8 comp_idx, uint8 fn_sel_idx, uint8 view_sel_idx) external {{
        vm.assume(args[0] < type(uint96).max);
        vm.deal(address(this), args[0] * 6);

        bytes memory bc_args = {ctor};
        address unopt = _deploy(abi.encodePacked(hex\"{unopt}\", bc_args));

        address comp;
        if (comp_idx == 0) {{
            comp = _deploy(abi.encodePacked(hex\"{legacy}\", bc_args));
        }} else if (comp_idx == 1) {{
            comp = _deploy(abi.encodePacked(hex\"{gas}\", bc_args));
        }} else {{
            comp = _deploy(abi.encodePacked(hex\"{size}\", bc_args));
        }}

        assert((comp == address(0)) == (unopt == address(0)));
        if (comp != address(0)) {{
            _compareDeployed(unopt, comp, args, fn_sel_idx, view_sel_idx);
        }}
    }}

",
        name = name,
        total = total,
        ctor = parts.constructor_args,
        unopt = bc.unoptimized,
        legacy = LEGACY_PLACEHOLDER,
        gas = bc.gas,
        size = bc.codesize,
    ));

    out.push_str(
        "    function _deploy(bytes memory bytecode) internal returns (address deployed) {
        assembly {
            deployed := create(0, add(bytecode, 0x20), mload(bytecode))
        }
    }

",
    );

    out.push_str(&format!(
        "    function _compareDeployed(address unopt, address comp, uint256[{total}] memory args, uint8 fn_sel_idx, uint8 view_sel_idx) internal {{
        bytes memory cd = mk_calldata(args, fn_sel_idx);
        (bool s_orig, bytes memory d_orig) = unopt.call{{value: args[0]}}(cd);
        (bool s_comp, bytes memory d_comp) = comp.call{{value: args[0]}}(cd);

        assert(s_orig == s_comp);
        assert(d_orig.length == d_comp.length);
        if (d_orig.length > 0) {{
            assert(keccak256(d_orig) == keccak256(d_comp));
        }}

        bytes memory view_calldata = mk_view_calldata(args, view_sel_idx);
        (s_orig, d_orig) = unopt.call(view_calldata);
        (s_comp, d_comp) = comp.call(view_calldata);

        assert(s_orig == s_comp);
        assert(d_orig.length == d_comp.length);
        if (d_orig.length > 0) {{
            assert(keccak256(d_orig) == keccak256(d_comp));
        }}
    }}

",
        total = total,
    ));

    out.push_str(&format!(
        "    function mk_calldata(uint256[{total}] memory args, uint8 fn_sel_idx) internal pure returns (bytes memory cd) {{
        {block}
    }}

",
        total = total,
        block = parts.dispatch.mutating,
    ));

    out.push_str(&format!(
        "    function mk_view_calldata(uint256[{total}] memory args, uint8 view_sel_idx) internal pure returns (bytes memory view_calldata) {{
        {block}
    }}
}}
",
        total = total,
        block = parts.dispatch.view,
    ));

    out
}
