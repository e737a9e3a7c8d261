//! `cargo impact properties` - List every property with its default and effective value

use crate::core::config::Property;
use crate::core::context::WorkspaceContext;
use crate::core::error::ImpactResult;

/// Run the properties command
pub fn run_properties(ctx: &WorkspaceContext) -> ImpactResult<()> {
  println!("⚙️  Impact properties ({})", ctx.root.display());
  println!("════════════════════════════════════════");

  for property in Property::ALL {
    let effective = ctx.properties.get(property);
    let marker = if effective == property.default_value() { " " } else { "*" };
    println!();
    println!("{} {}", marker, property.name());
    println!("    {}", property.description());
    println!("    default: {}", display_value(property.default_value()));
    println!("    value:   {}", display_value(effective));
    println!("    env:     {}", property.env_var());
  }

  println!();
  println!("* = overridden");
  Ok(())
}

fn display_value(value: &str) -> &str {
  if value.is_empty() { "(unset)" } else { value }
}
