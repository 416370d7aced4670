//! HTTP front end: `/metrics` (configurable) and a landing page.

use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::{error, info};
use tokio::net::TcpListener;

use crate::collector::runner::Exporter;
use crate::exposition;

/// Shared state behind every connection.
pub struct MetricsServer {
    exporter: Exporter,
    metrics_path: String,
    landing_page: String,
}

/// Routed response before it is turned into a hyper response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Bytes,
}

impl MetricsServer {
    /// `about` is shown preformatted on the landing page.
    pub fn new(exporter: Exporter, metrics_path: &str, about: &str) -> Self {
        let landing_page = format!(
            "<html>\n\
             <head><title>IEX Cloud Exporter</title></head>\n\
             <body>\n\
             <h1>IEX Cloud Exporter</h1>\n\
             <p><a href='{metrics_path}'>Metrics</a></p>\n\
             <h2>Options</h2>\n\
             <pre>{about}</pre>\n\
             <h2>Build</h2>\n\
             <pre>version {}</pre>\n\
             </body>\n\
             </html>\n",
            env!("CARGO_PKG_VERSION")
        );

        Self {
            exporter,
            metrics_path: metrics_path.to_string(),
            landing_page,
        }
    }

    /// Routes one request path.
    pub async fn route(&self, path: &str) -> Reply {
        if path == self.metrics_path {
            return self.metrics().await;
        }

        match path {
            "/" => Reply {
                status: StatusCode::OK,
                content_type: "text/html; charset=utf-8",
                body: Bytes::from(self.landing_page.clone()),
            },
            _ => Reply {
                status: StatusCode::NOT_FOUND,
                content_type: "text/plain; charset=utf-8",
                body: Bytes::from_static(b"not found"),
            },
        }
    }

    async fn metrics(&self) -> Reply {
        let scrape = self.exporter.scrape().await;

        match exposition::encode(&scrape.records, self.exporter.descriptors()) {
            Ok(buffer) => Reply {
                status: StatusCode::OK,
                content_type: exposition::CONTENT_TYPE,
                body: Bytes::from(buffer),
            },
            Err(e) => {
                error!("cannot encode metrics: {}", e);
                Reply {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    content_type: "text/plain; charset=utf-8",
                    body: Bytes::from(format!("cannot encode metrics: {e}")),
                }
            }
        }
    }

    async fn handle(
        self: Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let reply = self.route(req.uri().path()).await;

        let mut response = Response::new(Full::new(reply.body));
        *response.status_mut() = reply.status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(reply.content_type));
        Ok(response)
    }
}

/// Accept loop; one task per connection.
///
/// Returns only when accepting fails.
pub async fn serve(listener: TcpListener, server: Arc<MetricsServer>) -> std::io::Result<()> {
    info!("listening on address {}", listener.local_addr()?);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let server = server.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| server.clone().handle(req));

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("metrics server connection error: {}", e);
            }
        });
    }
}
