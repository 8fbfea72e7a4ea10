use std::process::Command;

use anyhow::{Context, Result};

/// Feature sets that must compile on their own, per package
const FEATURE_COMBINATIONS: &[(&str, &[&str])] = &[
    ("querydesk-common", &[]), // default
    ("querydesk-common", &["foundation"]),
    ("querydesk-common", &["observability"]),
    ("querydesk-common", &["runtime"]),
    ("querydesk-common", &["test-utils"]),
    ("querydesk-infra", &[]), // production build without test doubles
    ("querydesk-infra", &["test-utils"]),
];

/// Check that all required feature combinations compile successfully.
pub fn test_feature_matrix() -> Result<()> {
    println!("Testing {} feature combinations...", FEATURE_COMBINATIONS.len());

    for (index, (package, features)) in FEATURE_COMBINATIONS.iter().enumerate() {
        let joined = features.join(",");
        let is_default = features.is_empty();
        let display_label = if is_default { "default".to_string() } else { joined.clone() };
        let feature_arg = if is_default { None } else { Some(joined) };

        println!(
            "\n[{}/{}] cargo check -p {package} --no-default-features{}",
            index + 1,
            FEATURE_COMBINATIONS.len(),
            feature_arg.as_ref().map(|arg| format!(" --features {arg}")).unwrap_or_default()
        );

        let mut command = Command::new("cargo");
        command.arg("check").arg("-p").arg(package).arg("--no-default-features");

        if let Some(feature_list) = feature_arg.as_ref() {
            command.arg("--features").arg(feature_list.as_str());
        }

        let status = command
            .status()
            .with_context(|| format!("Failed to run cargo check for {package} '{display_label}'"))?;

        if !status.success() {
            anyhow::bail!("{package} feature combination '{display_label}' failed to compile");
        }

        println!("✅ {package} features '{display_label}' compiled successfully");
    }

    println!("\n✅ All {} feature combinations compile successfully!", FEATURE_COMBINATIONS.len());

    Ok(())
}
