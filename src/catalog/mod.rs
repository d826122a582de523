//! Source catalog - the static registry of reportable data sources.
//!
//! Each source maps an identifier to a physical table, its user-visible typed
//! columns, and an optional default date column used for period filtering.
//! Registration is static: adding a source is a code change, not a runtime
//! operation, and lookups never perform I/O.

use once_cell::sync::Lazy;

/// Semantic type of a source column.
///
/// Drives filter validation (which operators apply) and UI controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Number,
    Date,
    Boolean,
    Enum,
}

impl ColumnType {
    /// Whether values of this type can feed `sum`/`avg`/`min`/`max`.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Number)
    }
}

/// A column exposed by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Field name in the underlying table.
    pub key: &'static str,
    /// Display name.
    pub label: &'static str,
    pub ty: ColumnType,
}

/// A named, statically registered view over one data collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDefinition {
    pub id: &'static str,
    pub label: &'static str,
    /// Physical table the source reads from.
    pub table: &'static str,
    pub columns: Vec<ColumnDef>,
    /// Column the date-range filter applies to, when the source has one.
    pub default_date_column: Option<&'static str>,
}

impl SourceDefinition {
    /// Look up a column by key.
    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn has_column(&self, key: &str) -> bool {
        self.column(key).is_some()
    }

    /// All column keys, in registration order.
    pub fn column_keys(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.key.to_string()).collect()
    }
}

/// Tenant column present on every registered table.
///
/// Not part of any source's `columns`: it is never user-selectable or
/// user-filterable. The compiler injects it on every query.
pub const TENANT_COLUMN: &str = "organization_id";

fn col(key: &'static str, label: &'static str, ty: ColumnType) -> ColumnDef {
    ColumnDef { key, label, ty }
}

static SOURCES: Lazy<Vec<SourceDefinition>> = Lazy::new(|| {
    use ColumnType::*;
    vec![
        SourceDefinition {
            id: "sales",
            label: "Ventas",
            table: "sales",
            columns: vec![
                col("date", "Fecha", Date),
                col("total", "Total", Number),
                col("branch_id", "Sucursal", String),
                col("customer_name", "Cliente", String),
                col("payment_method", "Método de pago", Enum),
                col("status", "Estado", Enum),
            ],
            default_date_column: Some("date"),
        },
        SourceDefinition {
            id: "customers",
            label: "Clientes",
            table: "customers",
            columns: vec![
                col("created_at", "Fecha de alta", Date),
                col("name", "Nombre", String),
                col("email", "Correo", String),
                col("phone", "Teléfono", String),
                col("segment", "Segmento", Enum),
                col("lifetime_value", "Valor acumulado", Number),
            ],
            default_date_column: Some("created_at"),
        },
        SourceDefinition {
            id: "employees",
            label: "Empleados",
            table: "employees",
            columns: vec![
                col("hired_at", "Fecha de contratación", Date),
                col("full_name", "Nombre completo", String),
                col("department", "Departamento", Enum),
                col("position", "Puesto", String),
                col("base_salary", "Salario base", Number),
                col("active", "Activo", Boolean),
            ],
            default_date_column: Some("hired_at"),
        },
        SourceDefinition {
            id: "inventory_movements",
            label: "Movimientos de inventario",
            table: "inventory_movements",
            columns: vec![
                col("date", "Fecha", Date),
                col("product_name", "Producto", String),
                col("movement_type", "Tipo de movimiento", Enum),
                col("quantity", "Cantidad", Number),
                col("unit_cost", "Costo unitario", Number),
                col("warehouse", "Almacén", String),
            ],
            default_date_column: Some("date"),
        },
        SourceDefinition {
            id: "parking_sessions",
            label: "Sesiones de estacionamiento",
            table: "parking_sessions",
            columns: vec![
                col("entry_time", "Entrada", Date),
                col("space_code", "Cajón", String),
                col("vehicle_plate", "Placa", String),
                col("minutes", "Minutos", Number),
                col("amount", "Importe", Number),
                col("paid", "Pagado", Boolean),
            ],
            default_date_column: Some("entry_time"),
        },
    ]
});

/// All registered sources, in registration order.
pub fn sources() -> &'static [SourceDefinition] {
    &SOURCES
}

/// Look up a source by id.
///
/// An absent id means "no source selected" - callers disable downstream
/// behavior rather than treating it as an error at this layer.
pub fn get_source(id: &str) -> Option<&'static SourceDefinition> {
    SOURCES.iter().find(|s| s.id == id)
}
