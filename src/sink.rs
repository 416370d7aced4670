use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::schema::MetricRecord;

/// Many-producer side of a scrape's record stream.
///
/// Every collector task holds a clone. Sending never blocks:
/// the channel is unbounded and lives only for one scrape.
#[derive(Clone)]
pub struct MetricSink {
    tx: mpsc::UnboundedSender<MetricRecord>,
}

impl MetricSink {
    /// Creates a sink and the receiver it feeds.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MetricRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Pushes one record.
    ///
    /// A closed receiver means the scrape was abandoned; the record
    /// is dropped.
    pub fn emit(&self, record: MetricRecord) {
        if let Err(e) = self.tx.send(record) {
            debug!("sink closed, dropping {}", e.0);
        }
    }
}

/// Spawns the single consumer.
///
/// The task resolves once every `MetricSink` clone is dropped.
pub fn drain(mut rx: mpsc::UnboundedReceiver<MetricRecord>) -> JoinHandle<Vec<MetricRecord>> {
    tokio::spawn(async move {
        let mut records = Vec::new();
        while let Some(record) = rx.recv().await {
            records.push(record);
        }
        records
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricDescriptors;

    #[tokio::test]
    async fn drain_collects_from_all_clones() {
        let d = MetricDescriptors::new();
        let (sink, rx) = MetricSink::channel();
        let handle = drain(rx);

        let producers: Vec<_> = (0..4)
            .map(|i| {
                let sink = sink.clone();
                let record = d.price.gauge(i as f64, vec![format!("S{i}")]);
                tokio::spawn(async move { sink.emit(record) })
            })
            .collect();
        for p in producers {
            p.await.unwrap();
        }
        drop(sink);

        let records = handle.await.unwrap();
        assert_eq!(records.len(), 4);
    }
}
