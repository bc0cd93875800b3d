use crate::core::row::RowProcessor;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{InputRecord, OutputRecord, OUTPUT_HEADER, PROMPT_COLUMN};
use crate::domain::ports::{CompletionProvider, WebSearcher};
use crate::utils::error::{EtlError, Result};

/// Reads prompts from the input CSV, looks up staff contacts row by row,
/// and writes a `prompt,output` CSV.
pub struct StaffDirectoryPipeline<S, C, W, L>
where
    S: Storage,
    C: ConfigProvider,
    W: WebSearcher,
    L: CompletionProvider,
{
    storage: S,
    config: C,
    processor: RowProcessor<W, L>,
}

impl<S, C, W, L> StaffDirectoryPipeline<S, C, W, L>
where
    S: Storage,
    C: ConfigProvider,
    W: WebSearcher,
    L: CompletionProvider,
{
    pub fn new(storage: S, config: C, processor: RowProcessor<W, L>) -> Self {
        Self {
            storage,
            config,
            processor,
        }
    }
}

/// Parses a headered CSV into prompt rows, in file order.
///
/// A table without data rows is empty whatever its header says; the
/// `PROMPT` column is only required once there is a row to read it from.
pub fn parse_input_table(data: &[u8]) -> Result<Vec<InputRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

    let headers = reader.headers()?.clone();
    let has_prompt = headers.iter().any(|h| h == PROMPT_COLUMN);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if !has_prompt {
            return Err(EtlError::MissingColumnError {
                column: PROMPT_COLUMN.to_string(),
            });
        }
        records.push(row.deserialize::<InputRecord>(Some(&headers))?);
    }
    Ok(records)
}

/// Renders output rows as CSV. The header is written even with no rows.
pub fn render_output_table(records: &[OutputRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(OUTPUT_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))
}

#[async_trait::async_trait]
impl<S, C, W, L> Pipeline for StaffDirectoryPipeline<S, C, W, L>
where
    S: Storage,
    C: ConfigProvider,
    W: WebSearcher,
    L: CompletionProvider,
{
    async fn extract(&self) -> Result<Vec<InputRecord>> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading input table: {}", input_path);

        let data = self.storage.read_file(input_path).await?;
        let records = parse_input_table(&data)?;

        tracing::debug!("Loaded {} prompt rows from {}", records.len(), input_path);
        Ok(records)
    }

    async fn transform(&self, data: Vec<InputRecord>) -> Result<Vec<OutputRecord>> {
        let total = data.len();
        let mut outputs = Vec::with_capacity(total);

        // 逐列處理，搜尋失敗直接中止整個流程
        for (index, record) in data.into_iter().enumerate() {
            tracing::info!("🔎 Row {}/{}: {}", index + 1, total, record.prompt);

            let output = self.processor.process(&record.prompt).await?;
            println!("{}", output);

            outputs.push(OutputRecord {
                prompt: record.prompt,
                output,
            });
        }

        Ok(outputs)
    }

    async fn load(&self, result: Vec<OutputRecord>) -> Result<String> {
        let output_path = self.config.output_path();

        let data = render_output_table(&result)?;
        tracing::debug!(
            "Writing {} rows ({} bytes) to {}",
            result.len(),
            data.len(),
            output_path
        );
        self.storage.write_file(output_path, &data).await?;

        Ok(output_path.to_string())
    }
}
