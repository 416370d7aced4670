use async_trait::async_trait;

use crate::config::ParameterSet;
use crate::error::CollectError;
use crate::sink::MetricSink;

use super::{Collector, CollectorContext, CollectorKind};

/// Latest price per symbol.
///
/// One upstream call and one `iexcloud_price{symbol}` record per
/// configured symbol.
pub struct PriceCollector {
    symbols: Vec<String>,
    ctx: CollectorContext,
}

impl PriceCollector {
    pub fn new(params: ParameterSet, ctx: CollectorContext) -> Self {
        Self {
            symbols: params.symbols,
            ctx,
        }
    }
}

#[async_trait]
impl Collector for PriceCollector {
    fn kind(&self) -> CollectorKind {
        CollectorKind::Price
    }

    async fn emit(&self, sink: &MetricSink) -> Result<(), CollectError> {
        let desc = &self.ctx.descriptors.price;

        for symbol in &self.symbols {
            let price = self.ctx.call(symbol, self.ctx.client.price(symbol)).await?;
            sink.emit(desc.gauge(price, vec![symbol.clone()]));
        }

        Ok(())
    }
}
