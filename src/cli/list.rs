//! `list` command: the units a project offers.

use anyhow::Result;
use owo_colors::OwoColorize;

use super::{Cli, common};
use crate::descriptor::Manifest;
use crate::unit::{Unit, UnitKind};

pub fn list_units(cli: &Cli) -> Result<()> {
    let (project, _) = common::open_project(cli)?;

    println!("{}", "Themes".bold());
    print_units(project.themes(), UnitKind::Theme);
    println!("{}", "Extensions".bold());
    print_units(project.extensions(), UnitKind::Extension);
    Ok(())
}

fn print_units(manifests: impl Iterator<Item = Manifest>, kind: UnitKind) {
    let mut empty = true;
    for manifest in manifests {
        empty = false;
        match Unit::load(&manifest, kind) {
            Ok(unit) => println!("  {}", describe(&unit)),
            Err(e) => println!("  {:<24} {}", manifest.id.cyan(), e.red()),
        }
    }
    if empty {
        println!("  {}", "(none)".dimmed());
    }
}

/// `id  vendor - name - version  (base path)`
fn describe(unit: &Unit) -> String {
    format!(
        "{:<24} {} ({})",
        unit.id.cyan(),
        unit,
        unit.base_path.dimmed()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::unit;

    #[test]
    fn test_describe_names_id_and_base_path() {
        let line = describe(&unit("Cart", UnitKind::Extension));
        assert!(line.contains("Cart"));
        assert!(line.contains("Acme - Cart - 1.0.0"));
        assert!(line.contains("Acme/Cart"));
    }
}
