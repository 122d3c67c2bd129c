//! Post-processing stages applied to every scraped item.

use crate::item::{clean_price, timestamp, CleanableItem, Price};

pub trait Pipeline<I>: Send {
    fn name(&self) -> &str;

    fn open_spider(&mut self, _spider: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Returns `None` to drop the item.
    fn process_item(&mut self, item: I) -> anyhow::Result<Option<I>>;

    fn close_spider(&mut self, _spider: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// What happened to an item going through [`ItemPipelines`].
#[derive(Debug)]
pub enum Processed<I> {
    Kept(I),
    Dropped { by: String },
    Failed { by: String, error: anyhow::Error },
}

/// Pipelines run in ascending priority order.
pub struct ItemPipelines<I> {
    stages: Vec<(u32, Box<dyn Pipeline<I>>)>,
}

impl<I> Default for ItemPipelines<I> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<I> ItemPipelines<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<P>(mut self, priority: u32, pipeline: P) -> Self
    where
        P: Pipeline<I> + 'static,
    {
        self.add(priority, pipeline);
        self
    }

    pub fn add<P>(&mut self, priority: u32, pipeline: P)
    where
        P: Pipeline<I> + 'static,
    {
        let pos = self.stages.partition_point(|(p, _)| *p <= priority);
        self.stages.insert(pos, (priority, Box::new(pipeline)));
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|(_, p)| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn open_spider(&mut self, spider: &str) -> anyhow::Result<()> {
        for (_, stage) in self.stages.iter_mut() {
            stage.open_spider(spider)?;
        }
        Ok(())
    }

    pub fn process(&mut self, item: I) -> Processed<I> {
        let mut item = item;
        for (_, stage) in self.stages.iter_mut() {
            match stage.process_item(item) {
                Ok(Some(next)) => item = next,
                Ok(None) => {
                    return Processed::Dropped {
                        by: stage.name().to_string(),
                    }
                }
                Err(error) => {
                    return Processed::Failed {
                        by: stage.name().to_string(),
                        error,
                    }
                }
            }
        }
        Processed::Kept(item)
    }

    pub fn close_spider(&mut self, spider: &str) -> anyhow::Result<()> {
        for (_, stage) in self.stages.iter_mut() {
            stage.close_spider(spider)?;
        }
        Ok(())
    }
}

/// Turns raw prices into numbers and stamps the scraping time.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanDataPipeline;

impl CleanDataPipeline {
    pub const PRIORITY: u32 = 300;
}

impl<I> Pipeline<I> for CleanDataPipeline
where
    I: CleanableItem + Send,
{
    fn name(&self) -> &str {
        "CleanDataPipeline"
    }

    fn process_item(&mut self, mut item: I) -> anyhow::Result<Option<I>> {
        if let Some(price) = item.price_mut() {
            let amount = match &*price {
                Some(Price::Raw(raw)) if !raw.is_empty() => Some(clean_price(raw)),
                _ => None,
            };
            if let Some(amount) = amount {
                *price = Some(Price::Amount(amount));
            }
        }
        item.set_scraped_at(timestamp());
        Ok(Some(item))
    }
}
