//! `railstart flash` - show which toast a flash message turns into.

use serde::Serialize;

use railstart_core::domain::{FlashMessage, Notification, ToastOptions};

use crate::{
    cli::{FlashArgs, OutputFormat},
    error::{CliError, CliResult},
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct FlashView {
    #[serde(flatten)]
    notification: Notification,
    javascript: String,
    options: ToastOptions,
}

pub fn execute(args: FlashArgs, output: OutputManager) -> CliResult<()> {
    let notification = FlashMessage::new(&args.key, &args.message)
        .notify()
        .ok_or_else(|| CliError::InvalidInput {
            message: "flash key and message must both be non-empty".into(),
        })?;

    if args.json || output.format() == OutputFormat::Json {
        let javascript = notification.to_js();
        return output.json(&FlashView {
            notification,
            javascript,
            options: ToastOptions::default(),
        });
    }

    output.print(&format!("{}: {}", notification.severity, notification.message))?;
    output.detail(&notification.to_js())?;
    Ok(())
}
