// src/services/document_service.rs

use std::path::{Path, PathBuf};

use genpdf::{elements, style, Element};
use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::SessionDetail,
    services::inventory_service::InventoryService,
};

const FONT_FAMILY: &str = "Roboto";

/// Folha de contagem impressa de uma sessão de inventário.
#[derive(Clone)]
pub struct DocumentService {
    inventory: InventoryService,
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(inventory: InventoryService, fonts_dir: PathBuf) -> Self {
        Self { inventory, fonts_dir }
    }

    pub async fn generate_count_sheet<'a, A>(
        &self,
        conn: A,
        tenant_id: Uuid,
        session_id: Uuid,
    ) -> Result<Vec<u8>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let detail = self.inventory.get_session(conn, tenant_id, session_id).await?;
        render_count_sheet(&self.fonts_dir, &detail)
    }
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

pub fn render_count_sheet(fonts_dir: &Path, detail: &SessionDetail) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, FONT_FAMILY, None)
        .map_err(|_| AppError::FontNotFound(fonts_dir.display().to_string()))?;

    let session = &detail.session;

    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(format!("Inventário #{}", session.number));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    doc.push(elements::Paragraph::new(session.name.clone()).styled(style::Style::new().bold().with_font_size(16)));
    doc.push(elements::Paragraph::new(format!(
        "Sessão #{} | Tipo: {:?} | Status: {:?}",
        session.number, session.session_type, session.status
    )));
    doc.push(elements::Paragraph::new(format!("Aberta em: {}", session.created_at.format("%d/%m/%Y %H:%M"))));
    doc.push(elements::Break::new(1.5));

    // --- TABELA ---
    // Pesos: Local (3), Produto (4), Variação (2), Unidade (1), Contagem (2)
    let mut table = elements::TableLayout::new(vec![3, 4, 2, 1, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let bold = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Local").styled(bold))
        .element(elements::Paragraph::new("Produto").styled(bold))
        .element(elements::Paragraph::new("Variação").styled(bold))
        .element(elements::Paragraph::new("Un.").styled(bold))
        .element(elements::Paragraph::new("Contagem").styled(bold))
        .push()
        .map_err(pdf_error)?;

    for view in &detail.items {
        table
            .row()
            .element(elements::Paragraph::new(view.location_name.clone().unwrap_or_else(|| "-".into())))
            .element(elements::Paragraph::new(view.product_name.clone()))
            .element(elements::Paragraph::new(view.variation_name.clone().unwrap_or_default()))
            .element(elements::Paragraph::new(view.item.unit.clone()))
            .element(elements::Paragraph::new(count_cell(view.item.counted_quantity)))
            .push()
            .map_err(pdf_error)?;
    }

    doc.push(table);
    doc.push(elements::Break::new(2));
    doc.push(
        elements::Paragraph::new(format!("Itens: {}    Responsável: ______________________", detail.items.len()))
            .styled(style::Style::new().with_font_size(9)),
    );

    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(pdf_error)?;
    Ok(buffer)
}

// Zero fica em branco para preenchimento à mão
fn count_cell(quantity: Decimal) -> String {
    if quantity.is_zero() {
        String::new()
    } else {
        quantity.normalize().to_string()
    }
}
