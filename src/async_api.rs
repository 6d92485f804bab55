use crate::{document, Error, PageGeometry, Renderer, RendererConfig, Result};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Render(String, PageGeometry, oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly PDF renderer backed by a dedicated worker thread.
///
/// The worker thread owns one synchronous [`Renderer`] and executes
/// commands sent from async tasks, so callers get an async interface and
/// the browser is reused across renders. Commands run one at a time in
/// the order they were sent.
#[derive(Clone)]
pub struct PdfService {
    cmd_tx: Sender<Command>,
}

impl PdfService {
    /// Start a service backed by headless Chrome.
    #[cfg(feature = "cdp")]
    pub async fn new(config: RendererConfig) -> Result<Self> {
        Self::spawn::<crate::cdp::CdpRenderer>(config).await
    }

    /// Start a service backed by renderer `R`, created on the worker thread.
    ///
    /// Fails with the renderer's construction error, e.g.
    /// [`Error::MissingDependency`].
    pub async fn spawn<R: Renderer + 'static>(config: RendererConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let mut renderer = match R::new(config) {
                Ok(r) => r,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Render(html, page, resp) => {
                        let res = renderer.render_pdf(&html, &page);
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(renderer.close());
                        return;
                    }
                }
            }
            // All handles dropped without an explicit close
            let _ = renderer.close();
        });

        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;

        Ok(Self { cmd_tx })
    }

    /// Render arbitrary markup
    pub async fn render(&self, html: &str, page: PageGeometry) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Render(html.to_string(), page, tx))
            .map_err(|_| Error::Other("Renderer worker has shut down".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Render canceled: {}", e)))?
    }

    /// Render the menu document
    pub async fn render_menu(&self, page: PageGeometry) -> Result<Vec<u8>> {
        self.render(document::menu_html(), page).await
    }

    /// Shut down the worker and close the renderer.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Close(tx))
            .map_err(|_| Error::Other("Renderer worker has shut down".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}
