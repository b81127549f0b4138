use crate::app::template::Composite;
use anyhow::Result;
use serde::Serialize;

/// One block of the i3bar protocol.
#[derive(Debug, Serialize)]
struct I3barBlock<'a> {
    full_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<&'a str>,
    name: &'static str,
    instance: &'a str,
}

pub struct OutputGenerator;

impl OutputGenerator {
    pub fn plain(output: &Composite) -> String {
        output.to_string()
    }

    /// One block per colored span, so every part keeps its color.
    pub fn i3bar(output: &Composite, instance: &str) -> Result<String> {
        let blocks: Vec<I3barBlock> = output
            .spans()
            .iter()
            .map(|span| I3barBlock {
                full_text: &span.text,
                color: span.color.as_deref(),
                name: "file_status",
                instance,
            })
            .collect();

        Ok(serde_json::to_string(&blocks)?)
    }
}
