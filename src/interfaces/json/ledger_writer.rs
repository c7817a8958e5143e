use crate::domain::ledger::Ledger;
use crate::error::Result;
use std::io::Write;

/// Writes the ledger as a pretty-printed JSON array followed by a newline.
pub fn write_ledger<W: Write>(mut sink: W, ledger: &Ledger) -> Result<()> {
    serde_json::to_writer_pretty(&mut sink, ledger)?;
    writeln!(sink)?;
    Ok(())
}
