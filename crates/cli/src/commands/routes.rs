//! `clinicshop routes`

use std::io::Write;

use clinicshop_storefront::routes::routes;

use super::CommandError;

/// Print every route entry in precedence-independent registration order.
pub fn print() -> Result<(), CommandError> {
    let table = routes()?;
    let mut out = std::io::stdout().lock();
    for entry in table.entries() {
        let page = entry.page();
        let marker = if page.is_guarded() { "  (guarded)" } else { "" };
        writeln!(out, "{:<24} {page}{marker}", entry.pattern().as_str())?;
    }
    Ok(())
}
