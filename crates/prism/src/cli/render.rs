//! The `prism render` command: one request path, no server.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use prism_core::{Config, Prism, RenderRequest, Trace};

/// Arguments for the `render` command.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Request path, e.g. /uri/rw=480/mgid:file:gsp:assets:/a.jpg
    pub path: String,

    /// Write output here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Accept header used for format negotiation
    #[arg(long)]
    pub accept: Option<String>,

    /// Bypass the caches and fetch again from the origin
    #[arg(long)]
    pub refresh: bool,

    /// Write the processing trace instead of the image
    #[arg(long)]
    pub debug: bool,
}

/// Execute the render command.
pub async fn execute(args: RenderArgs, config: Config) -> anyhow::Result<()> {
    let prism = Prism::with_memory_store(config)?;

    let trace = if args.debug {
        Trace::collecting()
    } else {
        Trace::discard()
    };
    let request = RenderRequest::from_path(&args.path, trace.clone())?
        .with_accept(args.accept)
        .with_refresh(args.refresh);

    let rendered = prism.render(&request).await;
    let payload = match (args.debug, rendered) {
        (true, result) => {
            if let Err(e) = result {
                trace.note(format!("error: {e}"));
            }
            trace.render().into_bytes()
        }
        (false, result) => {
            let rendered = result?;
            tracing::info!(
                format = %rendered.format,
                bytes = rendered.bytes.len(),
                placeholder = rendered.placeholder,
                "Rendered {}",
                request.path
            );
            rendered.bytes.to_vec()
        }
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, &payload)?;
            println!("Wrote {} bytes to {}", payload.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&payload)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
