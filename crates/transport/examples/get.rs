use std::env;

use micro_transport::client::Http1Client;
use micro_transport::protocol::RequestMethod;
use micro_transport::transport::HttpTransport;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let uri = env::args().nth(1).unwrap_or_else(|| "http://127.0.0.1:8080/".to_owned()).parse()?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let transport = HttpTransport::new(Http1Client::default());
    let mut ctx = transport.create_context(RequestMethod::Get, uri, cancel);
    ctx.add_header("X-Trace", "get-example")?;

    if let Err(e) = transport.send(&mut ctx).await {
        error!(cause = %e, "request failed");
        return Err(e.into());
    }

    info!(status = ctx.status()?, content_type = ?ctx.get_header("Content-Type")?, "received response");

    let content = ctx.read_content(usize::MAX).await?;
    info!(length = content.len(), "read body");
    println!("{}", String::from_utf8_lossy(content));
    Ok(())
}
