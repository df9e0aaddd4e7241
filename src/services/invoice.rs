use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::InvoiceConfig;
use crate::services::llm::TokenUsage;

#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Could not read PDF: {0}")]
    InvalidPdf(String),

    #[error("PDF has no extractable text; upload a scanned page as an image")]
    EmptyPdf,

    #[error("Groq API key is not configured")]
    NotConfigured,

    #[error("Invoice extraction request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invoice extraction returned an empty response")]
    EmptyResponse,

    #[error("Invoice extraction returned invalid JSON: {0}")]
    InvalidJson(String),
}

/// Image types accepted by the upload endpoint, by extension
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("bmp", "image/bmp"),
];

/// How an uploaded file is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Sent to the vision model with this MIME type
    Image(&'static str),
    /// Text layer extracted locally
    Pdf,
}

/// Upload kind for a file name, or UnsupportedFile
pub fn upload_kind(filename: &str) -> Result<UploadKind, InvoiceError> {
    let ext = filename.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()).unwrap_or_default();
    if ext == "pdf" {
        return Ok(UploadKind::Pdf);
    }
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| UploadKind::Image(mime))
        .ok_or_else(|| InvoiceError::UnsupportedFile(if ext.is_empty() { filename.to_string() } else { format!(".{ext}") }))
}

/// Pull the text layer out of a PDF
pub async fn pdf_text(bytes: Vec<u8>) -> Result<String, InvoiceError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| InvoiceError::InvalidPdf(e.to_string()))?
        .map_err(|e| InvoiceError::InvalidPdf(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(InvoiceError::EmptyPdf);
    }
    Ok(text)
}

const INVOICE_PATTERNS: &[&str] = &[
    "invoice", "bill to", "factura", "rechnung", "facture", "fattura", "发票", "インボイス",
    "فاتورة", "חשבונית", "счет", "tax invoice", "billing statement", "payment due",
    "invoice number", "invoice no", "invoice #", "inv #", "inv no", "invoice date",
];
const RECEIPT_PATTERNS: &[&str] = &[
    "receipt", "payment received", "paid", "payment confirmation", "proof of payment",
    "recibo", "quittung", "reçu", "ricevuta", "收据", "領収書", "إيصال", "קבלה", "квитанция",
    "thank you for your purchase", "cash receipt", "payment receipt",
];
const PURCHASE_ORDER_PATTERNS: &[&str] = &[
    "purchase order", "p.o.", "p/o", "order confirmation", "order form",
    "orden de compra", "bestellung", "bon de commande", "ordine d'acquisto", "采购订单",
    "注文書", "أمر شراء", "הזמנת רכש", "заказ на покупку",
];
const QUOTE_PATTERNS: &[&str] = &[
    "quote", "estimate", "quotation", "proposal", "pro forma", "proforma",
    "presupuesto", "angebot", "devis", "preventivo", "报价", "見積もり",
    "عرض أسعار", "הצעת מחיר", "коммерческое предложение",
];
const STATEMENT_PATTERNS: &[&str] = &[
    "statement", "account statement", "statement of account", "monthly statement",
    "estado de cuenta", "kontoauszug", "relevé de compte", "estratto conto", "对账单",
    "取引明細書", "كشف حساب", "דף חשבון", "выписка по счету",
];
const CREDIT_NOTE_PATTERNS: &[&str] = &[
    "credit note", "credit memo", "credit memorandum", "refund",
    "nota de crédito", "gutschrift", "note de crédit", "nota di credito", "贷记通知单",
    "クレジットノート", "إشعار دائن", "הודעת זיכוי", "кредитное авизо",
];

static INV_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"inv[^a-z]").expect("valid pattern"));
static LONG_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4,}").expect("valid pattern"));

/// Classify a document by keyword patterns. Falls back to `invoice`.
pub fn classify_document(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let classes: [(&[&str], &'static str); 6] = [
        (INVOICE_PATTERNS, "invoice"),
        (RECEIPT_PATTERNS, "receipt"),
        (PURCHASE_ORDER_PATTERNS, "purchase_order"),
        (QUOTE_PATTERNS, "quote"),
        (STATEMENT_PATTERNS, "statement"),
        (CREDIT_NOTE_PATTERNS, "credit_note"),
    ];

    for (patterns, class) in classes {
        if patterns.iter().any(|p| lower.contains(p)) {
            return class;
        }
    }

    let has = |word: &str| lower.contains(word);
    if (has("total") && (has("due") || has("amount"))) || (has("payment") && has("terms")) || (has("tax") && has("subtotal"))
    {
        return "invoice";
    }
    if INV_PREFIX.is_match(&lower) && LONG_NUMBER.is_match(&lower) {
        return "invoice";
    }
    "invoice"
}

const EXTRACTION_SYSTEM_PROMPT: &str = "You are an expert invoice data extraction and financial auditing assistant. \
Extract all key information from the provided {document_type} and return only a valid JSON object with no extra text. \
Include: invoiceNumber, date, dueDate, vendor {name, address, taxId}, customer {name, address}, \
lineItems (keep the document's own field labels such as qty/quantity and rate/unitPrice/price), \
financials {subtotal, discount, tax, taxRate, shipping, total, currency, taxName, additionalTaxes}, \
payment {method, terms, bankDetails, paymentLink}, and meta {language (ISO 639-1), country, confidence {overall, fields}, \
audit {status, issues}}. Check that line amounts, subtotal and total are consistent and report issues under meta.audit.";

const TRANSCRIBE_SYSTEM_PROMPT: &str = "Extract all text content from this document exactly as it appears. \
Maintain the original layout and formatting as much as possible. Pay special attention to table structures and \
numerical data, invoice fields like dates, amounts and IDs, vendor and customer information, and line items with \
quantities and prices.";

#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub data: Value,
    pub token_usage: TokenUsage,
}

/// Invoice extraction over Groq's OpenAI-compatible chat completions API
pub struct InvoiceExtractor {
    http: reqwest::Client,
    config: InvoiceConfig,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl InvoiceExtractor {
    pub fn new(config: &InvoiceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    /// Extract structured fields from document text
    pub async fn extract_from_text(&self, text: &str, document_type: &str) -> Result<Extraction, InvoiceError> {
        let body = json!({
            "model": self.config.text_model,
            "temperature": 0.1,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": EXTRACTION_SYSTEM_PROMPT.replace("{document_type}", document_type)},
                {"role": "user", "content": format!("Extract invoice data from this text and return structured JSON:\n{text}")}
            ]
        });

        let (content, token_usage) = self.complete(body).await?;
        let data = serde_json::from_str(&content).map_err(|e| InvoiceError::InvalidJson(e.to_string()))?;
        Ok(Extraction { data, token_usage })
    }

    /// Transcribe an image with the vision model, then extract from the text
    pub async fn extract_from_image(&self, base64_image: &str, mime_type: &str) -> Result<Extraction, InvoiceError> {
        let body = json!({
            "model": self.config.vision_model,
            "temperature": 0.1,
            "messages": [
                {"role": "system", "content": TRANSCRIBE_SYSTEM_PROMPT},
                {"role": "user", "content": [
                    {"type": "text", "text": "Extract all text from this document with high accuracy:"},
                    {"type": "image_url", "image_url": {"url": format!("data:{mime_type};base64,{base64_image}")}}
                ]}
            ]
        });

        let (text, transcribe_usage) = self.complete(body).await?;
        let document_type = classify_document(&text);
        tracing::debug!("Transcribed image classified as {}", document_type);

        let mut extraction = self.extract_from_text(&text, document_type).await?;
        extraction.token_usage += transcribe_usage;
        Ok(extraction)
    }

    async fn complete(&self, body: Value) -> Result<(String, TokenUsage), InvoiceError> {
        if self.config.groq_api_key.trim().is_empty() {
            return Err(InvoiceError::NotConfigured);
        }

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(&self.config.groq_api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(InvoiceError::EmptyResponse)?;

        Ok((content, usage))
    }
}
