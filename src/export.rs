// src/export.rs
//
// Server-side rendition of the per-entity PDF exports: one full-table
// document per collection and one "ficha" document per record, both built
// coordinate-by-coordinate on an A4 page with the builtin Helvetica faces.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb};

use crate::format::{format_currency, format_date, format_date_opt, format_datetime};
use crate::models::colaborador::Colaborador;
use crate::models::despesa::Despesa;
use crate::models::projecto::Projecto;
use crate::models::receita::Receita;
use crate::models::user::User;

const PAGE_W: f64 = 210.0;
const PAGE_H: f64 = 297.0;
const MARGIN: f64 = 14.0;
const TABLE_W: f64 = PAGE_W - 2.0 * MARGIN;

const TITLE_SIZE: f64 = 18.0;
const HEADER_SIZE: f64 = 9.0;
const BODY_SIZE: f64 = 9.0;
const FOOTER_SIZE: f64 = 9.0;

const TABLE_TOP: f64 = PAGE_H - 30.0;
const HEADER_H: f64 = 8.0;
const ROW_H: f64 = 7.0;
// Rows that fit between the column header band and the footer area.
const ROWS_PER_PAGE: usize = 32;

const PT_TO_MM: f64 = 0.352_778;

/// Static description of one entity's table export.
pub struct TableSpec {
    pub title: &'static str,
    pub file_name: &'static str,
    pub headers: &'static [&'static str],
    pub widths: &'static [f64],
}

pub const COLABORADORES_TABLE: TableSpec = TableSpec {
    title: "GestãoDev - Lista de Colaboradores",
    file_name: "colaboradores.pdf",
    headers: &["Nome Completo", "Email", "Telefone", "Função", "Departamento", "Estado"],
    widths: &[40.0, 40.0, 28.0, 26.0, 26.0, 22.0],
};

pub const PROJECTOS_TABLE: TableSpec = TableSpec {
    title: "GestãoDev - Lista de Projectos",
    file_name: "projectos.pdf",
    headers: &["Nome do Projecto", "Responsável", "Departamento", "Cliente", "Início", "Fim Previsto", "Orçamento", "Estado"],
    widths: &[30.0, 22.0, 22.0, 22.0, 18.0, 20.0, 26.0, 22.0],
};

pub const DESPESAS_TABLE: TableSpec = TableSpec {
    title: "GestãoDev - Lista de Despesas",
    file_name: "despesas.pdf",
    headers: &["Entidade", "Valor", "Data de Emissão", "Data de Vencimento", "Metódo de Pagamento", "Estado"],
    widths: &[35.0, 25.0, 28.0, 28.0, 38.0, 28.0],
};

pub const RECEITAS_TABLE: TableSpec = TableSpec {
    title: "GestãoDev - Lista de Receitas",
    file_name: "receitas.pdf",
    headers: &["Categoria", "Descrição da Receita", "Valor", "Metodo de pagamento", "Estado"],
    widths: &[36.0, 50.0, 28.0, 38.0, 30.0],
};

pub const USERS_TABLE: TableSpec = TableSpec {
    title: "GestãoDev - Lista de Usuários",
    file_name: "lista_de_usuarios.pdf",
    headers: &["Nome", "Email", "Nível de acesso"],
    widths: &[60.0, 70.0, 52.0],
};

// ---------------------------------------------------------------------------
// Row building. Pure with respect to the input list: the generation
// timestamp only enters at render time, injected by the caller.
// ---------------------------------------------------------------------------

pub fn colaborador_rows(colaboradores: &[Colaborador]) -> Vec<Vec<String>> {
    colaboradores
        .iter()
        .map(|c| {
            vec![
                format!("{} {}", c.nome, c.apelido).trim().to_string(),
                c.email.clone(),
                c.telefone.clone(),
                c.funcao.clone(),
                c.departamento.clone(),
                c.estado.as_str().to_string(),
            ]
        })
        .collect()
}

pub fn projecto_rows(projectos: &[Projecto]) -> Vec<Vec<String>> {
    projectos
        .iter()
        .map(|p| {
            vec![
                p.nome.clone(),
                p.responsavel.clone(),
                p.departamento.clone(),
                p.cliente_id.clone(),
                format_date(&p.data_inicio),
                format_date_opt(&p.data_fim_prevista),
                format_currency(p.valor_orcamento),
                p.status.as_str().to_string(),
            ]
        })
        .collect()
}

pub fn despesa_rows(despesas: &[Despesa]) -> Vec<Vec<String>> {
    despesas
        .iter()
        .map(|d| {
            vec![
                d.entidade.clone(),
                format_currency(d.valor),
                format_date_opt(&d.data_emissao),
                format_date_opt(&d.data_vencimento),
                d.metodo_pagamento.as_str().to_string(),
                d.estado.as_str().to_string(),
            ]
        })
        .collect()
}

pub fn receita_rows(receitas: &[Receita]) -> Vec<Vec<String>> {
    receitas
        .iter()
        .map(|r| {
            vec![
                r.categoria.as_str().to_string(),
                r.descricao.clone(),
                format_currency(r.valor),
                r.metodo_pagamento.as_str().to_string(),
                r.estado.as_str().to_string(),
            ]
        })
        .collect()
}

pub fn user_rows(users: &[User]) -> Vec<Vec<String>> {
    users
        .iter()
        .map(|u| vec![u.name.clone(), u.email.clone(), u.role.clone()])
        .collect()
}

// ---------------------------------------------------------------------------
// Ficha (single record) field lists.
// ---------------------------------------------------------------------------

pub fn colaborador_detail(c: &Colaborador) -> Vec<(&'static str, String)> {
    vec![
        ("Nome", c.nome.clone()),
        ("Apelido", c.apelido.clone()),
        ("Email", c.email.clone()),
        ("Telefone", c.telefone.clone()),
        ("Função", c.funcao.clone()),
        ("Departamento", c.departamento.clone()),
        ("Contrato", c.contrato.as_str().to_string()),
        ("Estado", c.estado.as_str().to_string()),
        ("Género", c.genero.as_str().to_string()),
        ("Data de Nascimento", format_date_opt(&c.data_nascimento)),
        ("Morada", c.morada.clone()),
    ]
}

pub fn projecto_detail(p: &Projecto) -> Vec<(&'static str, String)> {
    vec![
        ("Nome", p.nome.clone()),
        ("Referência", p.referencia.clone()),
        ("Descrição", p.descricao.clone()),
        ("Cliente", p.cliente_id.clone()),
        ("Responsável", p.responsavel.clone()),
        ("Departamento", p.departamento.clone()),
        ("Estado", p.status.as_str().to_string()),
        ("Início", format_date(&p.data_inicio)),
        ("Fim Previsto", format_date_opt(&p.data_fim_prevista)),
        ("Fim Real", format_date_opt(&p.data_fim_real)),
        ("Orçamento", format_currency(p.valor_orcamento)),
    ]
}

pub fn despesa_detail(d: &Despesa) -> Vec<(&'static str, String)> {
    vec![
        ("Entidade", d.entidade.clone()),
        ("Valor", format_currency(d.valor)),
        ("Descrição", d.descricao.clone()),
        ("Data de Emissão", format_date_opt(&d.data_emissao)),
        ("Data de Vencimento", format_date_opt(&d.data_vencimento)),
        ("Método de Pagamento", d.metodo_pagamento.as_str().to_string()),
        ("Estado", d.estado.as_str().to_string()),
    ]
}

pub fn receita_detail(r: &Receita) -> Vec<(&'static str, String)> {
    vec![
        ("Categoria", r.categoria.as_str().to_string()),
        ("Descrição", r.descricao.clone()),
        ("Valor", format_currency(r.valor)),
        ("Data", format_date_opt(&r.data)),
        ("Método de Pagamento", r.metodo_pagamento.as_str().to_string()),
        ("Estado", r.estado.as_str().to_string()),
        ("Observações", r.observacoes.clone()),
    ]
}

pub fn user_detail(u: &User) -> Vec<(&'static str, String)> {
    vec![
        ("Nome", u.name.clone()),
        ("Email", u.email.clone()),
        ("Nível de acesso", u.role.clone()),
    ]
}

// ---------------------------------------------------------------------------
// Rendering.
// ---------------------------------------------------------------------------

pub fn pages_needed(row_count: usize) -> usize {
    if row_count == 0 {
        1
    } else {
        (row_count + ROWS_PER_PAGE - 1) / ROWS_PER_PAGE
    }
}

/// Full-table export. Title on the first page, the column header band and
/// bordered rows on every page, the standard footer at the bottom of each.
pub fn render_table_pdf(
    spec: &TableSpec,
    rows: &[Vec<String>],
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, String> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(spec.title, Mm(PAGE_W), Mm(PAGE_H), "Camada 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| e.to_string())?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| e.to_string())?;

    let total_pages = pages_needed(rows.len());
    let mut pages = vec![(first_page, first_layer)];
    for _ in 1..total_pages {
        pages.push(doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Camada 1"));
    }

    for (page_index, (page, layer_index)) in pages.iter().enumerate() {
        let layer = doc.get_page(*page).get_layer(*layer_index);

        if page_index == 0 {
            layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
            layer.use_text(spec.title, TITLE_SIZE, Mm(MARGIN), Mm(PAGE_H - 22.0), &font);
        }

        let page_rows = rows
            .iter()
            .skip(page_index * ROWS_PER_PAGE)
            .take(ROWS_PER_PAGE)
            .collect::<Vec<_>>();

        draw_table(&layer, spec, &page_rows, &font, &bold);
        draw_footer(&layer, &font, page_index + 1, total_pages, generated_at);
    }

    doc.save_to_bytes().map_err(|e| e.to_string())
}

/// Single-record "ficha": a title line and one "Label: value" line per
/// field, with the standard footer.
pub fn render_record_pdf(
    title: &str,
    fields: &[(&'static str, String)],
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, String> {
    let (doc, page, layer_index) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Camada 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| e.to_string())?;

    let layer = doc.get_page(page).get_layer(layer_index);
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.use_text(title, 16.0, Mm(MARGIN), Mm(PAGE_H - 20.0), &font);

    let mut y = PAGE_H - 40.0;
    for (label, value) in fields {
        layer.use_text(format!("{}: {}", label, value), 12.0, Mm(MARGIN), Mm(y), &font);
        y -= 10.0;
    }

    draw_footer(&layer, &font, 1, 1, generated_at);
    doc.save_to_bytes().map_err(|e| e.to_string())
}

fn draw_table(
    layer: &PdfLayerReference,
    spec: &TableSpec,
    page_rows: &[&Vec<String>],
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    let header_bottom = TABLE_TOP - HEADER_H;

    // Column header band: dark fill, white labels.
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    filled_rect(layer, MARGIN, header_bottom, TABLE_W, HEADER_H);
    layer.set_fill_color(Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None)));
    let mut x = MARGIN;
    for (header, width) in spec.headers.iter().zip(spec.widths) {
        layer.use_text(
            fit_text(header, width - 3.0, HEADER_SIZE),
            HEADER_SIZE,
            Mm(x + 1.5),
            Mm(header_bottom + 2.5),
            bold,
        );
        x += width;
    }

    // Body rows.
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    for (i, row) in page_rows.iter().enumerate() {
        let baseline = header_bottom - (i as f64) * ROW_H - 5.0;
        let mut x = MARGIN;
        for (cell, width) in row.iter().zip(spec.widths) {
            layer.use_text(
                fit_text(cell, width - 3.0, BODY_SIZE),
                BODY_SIZE,
                Mm(x + 1.5),
                Mm(baseline),
                font,
            );
            x += width;
        }
    }

    // Gray cell borders.
    let table_bottom = header_bottom - (page_rows.len() as f64) * ROW_H;
    layer.set_outline_color(Color::Rgb(Rgb::new(0.42, 0.45, 0.50, None)));
    layer.set_outline_thickness(0.2);
    for i in 0..=page_rows.len() {
        let y = header_bottom - (i as f64) * ROW_H;
        stroked_line(layer, MARGIN, y, MARGIN + TABLE_W, y);
    }
    stroked_line(layer, MARGIN, TABLE_TOP, MARGIN + TABLE_W, TABLE_TOP);
    let mut x = MARGIN;
    for width in spec.widths {
        stroked_line(layer, x, TABLE_TOP, x, table_bottom);
        x += width;
    }
    stroked_line(layer, MARGIN + TABLE_W, TABLE_TOP, MARGIN + TABLE_W, table_bottom);
}

/// The footer every exported page carries: separator rule, generation
/// timestamp, system tagline and page numbering.
fn draw_footer(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    page_number: usize,
    total_pages: usize,
    generated_at: DateTime<Utc>,
) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.70, 0.70, 0.70, None)));
    layer.set_outline_thickness(0.3);
    stroked_line(layer, MARGIN, 18.0, PAGE_W - MARGIN, 18.0);

    layer.set_fill_color(Color::Rgb(Rgb::new(0.47, 0.47, 0.47, None)));
    layer.use_text(
        format!("Gerado em: {}", format_datetime(&generated_at)),
        FOOTER_SIZE,
        Mm(MARGIN),
        Mm(10.0),
        font,
    );

    let tagline = "Processado por GestãoDev - Seu Sistema Administrativo";
    let tagline_x = (PAGE_W - approx_text_width(tagline, FOOTER_SIZE)) / 2.0;
    layer.use_text(tagline, FOOTER_SIZE, Mm(tagline_x), Mm(10.0), font);

    let pagination = format!("Página {} de {}", page_number, total_pages);
    let pagination_x = PAGE_W - MARGIN - approx_text_width(&pagination, FOOTER_SIZE);
    layer.use_text(pagination, FOOTER_SIZE, Mm(pagination_x), Mm(10.0), font);
}

fn filled_rect(layer: &PdfLayerReference, x: f64, y: f64, w: f64, h: f64) {
    let rect = Line {
        points: vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y + h)), false),
            (Point::new(Mm(x), Mm(y + h)), false),
        ],
        is_closed: true,
        has_fill: true,
        has_stroke: false,
        is_clipping_path: false,
    };
    layer.add_shape(rect);
}

fn stroked_line(layer: &PdfLayerReference, x1: f64, y1: f64, x2: f64, y2: f64) {
    let line = Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y1)), false),
            (Point::new(Mm(x2), Mm(y2)), false),
        ],
        is_closed: false,
        has_fill: false,
        has_stroke: true,
        is_clipping_path: false,
    };
    layer.add_shape(line);
}

/// Rough Helvetica advance width, close enough to centre and right-align
/// the short footer strings.
fn approx_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * 0.5 * PT_TO_MM
}

/// Cells never wrap; overlong values are cut with an ellipsis like the
/// fixed-width table columns cut them visually.
fn fit_text(text: &str, width: f64, font_size: f64) -> String {
    let max_chars = (width / (font_size * 0.5 * PT_TO_MM)) as usize;
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::despesa::{EstadoDespesa, MetodoPagamento};
    use crate::models::CriadoPor;
    use chrono::TimeZone;

    fn fixture_despesas() -> Vec<Despesa> {
        vec![
            Despesa {
                despesa_id: "d-1".to_string(),
                entidade: "EDM".to_string(),
                valor: 1500.0,
                metodo_pagamento: MetodoPagamento::Transferencia,
                data_emissao: Some(Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap()),
                data_vencimento: None,
                estado: EstadoDespesa::Pendente,
                descricao: "Energia".to_string(),
                criado_em: Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap(),
                atualizado_em: None,
                criado_por: CriadoPor::default(),
            },
            Despesa {
                despesa_id: "d-2".to_string(),
                entidade: "Águas da Região".to_string(),
                valor: 320.75,
                metodo_pagamento: MetodoPagamento::Dinheiro,
                data_emissao: None,
                data_vencimento: None,
                estado: EstadoDespesa::Pago,
                descricao: String::new(),
                criado_em: Utc.with_ymd_and_hms(2024, 5, 3, 9, 0, 0).unwrap(),
                atualizado_em: None,
                criado_por: CriadoPor::default(),
            },
        ]
    }

    #[test]
    fn despesa_rows_format_currency_dates_and_enums() {
        let rows = despesa_rows(&fixture_despesas());
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec!["EDM", "1.500,00 MZN", "02/05/2024", "", "Transferência", "Pendente"]
        );
        assert_eq!(rows[1][1], "320,75 MZN");
        assert_eq!(rows[1][5], "Pago");
    }

    #[test]
    fn row_building_is_pure_over_its_input() {
        let despesas = fixture_despesas();
        assert_eq!(despesa_rows(&despesas), despesa_rows(&despesas));
    }

    #[test]
    fn page_count_covers_the_row_count() {
        assert_eq!(pages_needed(0), 1);
        assert_eq!(pages_needed(1), 1);
        assert_eq!(pages_needed(ROWS_PER_PAGE), 1);
        assert_eq!(pages_needed(ROWS_PER_PAGE + 1), 2);
        assert_eq!(pages_needed(3 * ROWS_PER_PAGE), 3);
    }

    #[test]
    fn fit_text_cuts_overlong_cells_with_an_ellipsis() {
        assert_eq!(fit_text("curto", 30.0, 9.0), "curto");
        let cut = fit_text(
            "uma descrição demasiado longa para caber numa célula estreita",
            12.0,
            9.0,
        );
        assert!(cut.ends_with('…'));
        assert!(cut.chars().count() <= 8);
    }

    #[test]
    fn table_pdf_renders_to_a_pdf_body() {
        let generated_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let rows = despesa_rows(&fixture_despesas());
        let bytes = render_table_pdf(&DESPESAS_TABLE, &rows, generated_at).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn record_pdf_renders_to_a_pdf_body() {
        let generated_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let despesas = fixture_despesas();
        let fields = despesa_detail(&despesas[0]);
        let bytes =
            render_record_pdf("Ficha da Despesa - EDM", &fields, generated_at).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
