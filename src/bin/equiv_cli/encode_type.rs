//! Encode-type command - print the harness expression for one parameter type

use anyhow::Result;
use clap::Parser;

use super::output::{format_encoding, format_error};
use vyper_opt_equiv::encoder::encode_type;

#[derive(Parser, Debug)]
pub struct EncodeTypeCmd {
    /// Declared Vyper/ABI type, e.g. `uint8`, `address[2]`, `int128[2][]`
    pub ty: String,

    /// Argument slot the expression reads
    #[arg(long, default_value_t = 0)]
    pub slot: usize,
}

impl EncodeTypeCmd {
    pub fn execute(&self, json_output: bool) -> Result<()> {
        match encode_type(&self.ty, self.slot) {
            Ok(expr) => {
                println!(
                    "{}",
                    format_encoding(&self.ty, self.slot, expr.as_str(), json_output)
                );
                Ok(())
            }
            Err(e) => {
                let e = anyhow::Error::new(e).context(format!("cannot encode `{}`", self.ty));
                eprintln!("{}", format_error(&e, json_output));
                Err(e)
            }
        }
    }
}
