use anyhow::Result;

fn main() -> Result<()> {
    reftest_import_cli::main_entry()
}
