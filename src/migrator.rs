use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_registry_tables::Migration),
            Box::new(m20240301_000002_create_quote_tables::Migration),
            Box::new(m20240301_000003_create_field_tables::Migration),
            Box::new(m20240301_000004_create_finance_tables::Migration),
            Box::new(m20240301_000005_create_audit_log_table::Migration),
        ]
    }
}

fn id_column<T: IntoIden>(iden: T) -> ColumnDef {
    ColumnDef::new(iden)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn money_column<T: IntoIden>(iden: T) -> ColumnDef {
    ColumnDef::new(iden)
        .decimal_len(14, 2)
        .not_null()
        .default(0)
        .to_owned()
}

mod m20240301_000001_create_registry_tables {
    use super::{id_column, money_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_registry_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Clients::Table)
                        .if_not_exists()
                        .col(id_column(Clients::Id))
                        .col(ColumnDef::new(Clients::Name).string().not_null())
                        .col(ColumnDef::new(Clients::Phone).string().null())
                        .col(ColumnDef::new(Clients::Address).string().null())
                        .col(
                            ColumnDef::new(Clients::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Clients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Workers::Table)
                        .if_not_exists()
                        .col(id_column(Workers::Id))
                        .col(ColumnDef::new(Workers::Name).string().not_null())
                        .col(ColumnDef::new(Workers::Role).string_len(16).not_null())
                        .col(ColumnDef::new(Workers::Phone).string().null())
                        .col(money_column(Workers::DailyRate))
                        .col(
                            ColumnDef::new(Workers::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Workers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(JobSites::Table)
                        .if_not_exists()
                        .col(id_column(JobSites::Id))
                        .col(ColumnDef::new(JobSites::ClientId).integer().not_null())
                        .col(ColumnDef::new(JobSites::Title).string().not_null())
                        .col(ColumnDef::new(JobSites::Address).string().null())
                        .col(ColumnDef::new(JobSites::Status).string_len(16).not_null())
                        .col(
                            ColumnDef::new(JobSites::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(JobSites::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_job_sites_client_id")
                                .from(JobSites::Table, JobSites::ClientId)
                                .to(Clients::Table, Clients::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ServiceCatalog::Table)
                        .if_not_exists()
                        .col(id_column(ServiceCatalog::Id))
                        .col(ColumnDef::new(ServiceCatalog::Name).string().not_null())
                        .col(ColumnDef::new(ServiceCatalog::Unit).string_len(8).not_null())
                        .col(
                            ColumnDef::new(ServiceCatalog::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServiceCatalog::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(JobSites::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Workers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Clients::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Clients {
        Table,
        Id,
        Name,
        Phone,
        Address,
        Active,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Workers {
        Table,
        Id,
        Name,
        Role,
        Phone,
        DailyRate,
        Active,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum JobSites {
        Table,
        Id,
        ClientId,
        Title,
        Address,
        Status,
        Active,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ServiceCatalog {
        Table,
        Id,
        Name,
        Unit,
        Active,
    }
}

mod m20240301_000002_create_quote_tables {
    use super::m20240301_000001_create_registry_tables::{JobSites, ServiceCatalog};
    use super::{id_column, money_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_quote_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Quotes::Table)
                        .if_not_exists()
                        .col(id_column(Quotes::Id))
                        .col(ColumnDef::new(Quotes::JobSiteId).integer().not_null())
                        .col(ColumnDef::new(Quotes::Version).integer().not_null())
                        .col(ColumnDef::new(Quotes::Status).string_len(16).not_null())
                        .col(money_column(Quotes::TotalAmount))
                        .col(money_column(Quotes::DiscountAmount))
                        .col(money_column(Quotes::FinalAmount))
                        .col(ColumnDef::new(Quotes::ValidUntil).date().null())
                        .col(
                            ColumnDef::new(Quotes::ApprovedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Quotes::CanceledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Quotes::DocumentRef).string().null())
                        .col(
                            ColumnDef::new(Quotes::DocumentIssuedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Quotes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotes_job_site_id")
                                .from(Quotes::Table, Quotes::JobSiteId)
                                .to(JobSites::Table, JobSites::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_quotes_job_site_version")
                        .table(Quotes::Table)
                        .col(Quotes::JobSiteId)
                        .col(Quotes::Version)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Phases::Table)
                        .if_not_exists()
                        .col(id_column(Phases::Id))
                        .col(ColumnDef::new(Phases::JobSiteId).integer().not_null())
                        .col(ColumnDef::new(Phases::QuoteId).integer().not_null())
                        .col(ColumnDef::new(Phases::Name).string().not_null())
                        .col(ColumnDef::new(Phases::SortOrder).integer().not_null())
                        .col(ColumnDef::new(Phases::Status).string_len(16).not_null())
                        .col(money_column(Phases::PhaseAmount))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_phases_job_site_id")
                                .from(Phases::Table, Phases::JobSiteId)
                                .to(JobSites::Table, JobSites::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_phases_quote_id")
                                .from(Phases::Table, Phases::QuoteId)
                                .to(Quotes::Table, Quotes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_phases_quote_id")
                        .table(Phases::Table)
                        .col(Phases::QuoteId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PhaseServiceLines::Table)
                        .if_not_exists()
                        .col(id_column(PhaseServiceLines::Id))
                        .col(
                            ColumnDef::new(PhaseServiceLines::PhaseId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PhaseServiceLines::ServiceId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PhaseServiceLines::Quantity)
                                .decimal_len(14, 3)
                                .not_null(),
                        )
                        .col(money_column(PhaseServiceLines::UnitPrice))
                        .col(money_column(PhaseServiceLines::LineTotal))
                        .col(
                            ColumnDef::new(PhaseServiceLines::Observation)
                                .string()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_phase_service_lines_phase_id")
                                .from(PhaseServiceLines::Table, PhaseServiceLines::PhaseId)
                                .to(Phases::Table, Phases::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_phase_service_lines_service_id")
                                .from(PhaseServiceLines::Table, PhaseServiceLines::ServiceId)
                                .to(ServiceCatalog::Table, ServiceCatalog::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_phase_service_lines_phase_service")
                        .table(PhaseServiceLines::Table)
                        .col(PhaseServiceLines::PhaseId)
                        .col(PhaseServiceLines::ServiceId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PhaseServiceLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Phases::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Quotes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Quotes {
        Table,
        Id,
        JobSiteId,
        Version,
        Status,
        TotalAmount,
        DiscountAmount,
        FinalAmount,
        ValidUntil,
        ApprovedAt,
        CanceledAt,
        DocumentRef,
        DocumentIssuedAt,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Phases {
        Table,
        Id,
        JobSiteId,
        QuoteId,
        Name,
        SortOrder,
        Status,
        PhaseAmount,
    }

    #[derive(DeriveIden)]
    enum PhaseServiceLines {
        Table,
        Id,
        PhaseId,
        ServiceId,
        Quantity,
        UnitPrice,
        LineTotal,
        Observation,
    }
}

mod m20240301_000003_create_field_tables {
    use super::m20240301_000001_create_registry_tables::{JobSites, Workers};
    use super::m20240301_000002_create_quote_tables::{Phases, Quotes};
    use super::{id_column, money_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_field_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Allocations::Table)
                        .if_not_exists()
                        .col(id_column(Allocations::Id))
                        .col(ColumnDef::new(Allocations::Date).date().not_null())
                        .col(ColumnDef::new(Allocations::WorkerId).integer().not_null())
                        .col(ColumnDef::new(Allocations::JobSiteId).integer().not_null())
                        .col(ColumnDef::new(Allocations::Period).string_len(8).not_null())
                        .col(ColumnDef::new(Allocations::Kind).string_len(16).not_null())
                        .col(ColumnDef::new(Allocations::QuoteId).integer().null())
                        .col(ColumnDef::new(Allocations::PhaseId).integer().null())
                        .col(
                            ColumnDef::new(Allocations::Confirmed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Allocations::Observation).string().null())
                        .col(
                            ColumnDef::new(Allocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_allocations_worker_id")
                                .from(Allocations::Table, Allocations::WorkerId)
                                .to(Workers::Table, Workers::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_allocations_job_site_id")
                                .from(Allocations::Table, Allocations::JobSiteId)
                                .to(JobSites::Table, JobSites::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_allocations_quote_id")
                                .from(Allocations::Table, Allocations::QuoteId)
                                .to(Quotes::Table, Quotes::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_allocations_phase_id")
                                .from(Allocations::Table, Allocations::PhaseId)
                                .to(Phases::Table, Phases::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_allocations_date")
                        .table(Allocations::Table)
                        .col(Allocations::Date)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductionEntries::Table)
                        .if_not_exists()
                        .col(id_column(ProductionEntries::Id))
                        .col(
                            ColumnDef::new(ProductionEntries::JobSiteId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionEntries::QuoteId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionEntries::PhaseId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionEntries::WorkerId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionEntries::Date).date().not_null())
                        .col(
                            ColumnDef::new(ProductionEntries::DayType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(money_column(ProductionEntries::BaseValue))
                        .col(money_column(ProductionEntries::DiscountValue))
                        .col(money_column(ProductionEntries::GrossValue))
                        .col(money_column(ProductionEntries::FinalValue))
                        .col(
                            ColumnDef::new(ProductionEntries::Observation)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionEntries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_entries_job_site_id")
                                .from(ProductionEntries::Table, ProductionEntries::JobSiteId)
                                .to(JobSites::Table, JobSites::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_entries_quote_id")
                                .from(ProductionEntries::Table, ProductionEntries::QuoteId)
                                .to(Quotes::Table, Quotes::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_entries_phase_id")
                                .from(ProductionEntries::Table, ProductionEntries::PhaseId)
                                .to(Phases::Table, Phases::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_entries_worker_id")
                                .from(ProductionEntries::Table, ProductionEntries::WorkerId)
                                .to(Workers::Table, Workers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_entries_date")
                        .table(ProductionEntries::Table)
                        .col(ProductionEntries::Date)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionEntries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Allocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Allocations {
        Table,
        Id,
        Date,
        WorkerId,
        JobSiteId,
        Period,
        Kind,
        QuoteId,
        PhaseId,
        Confirmed,
        Observation,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductionEntries {
        Table,
        Id,
        JobSiteId,
        QuoteId,
        PhaseId,
        WorkerId,
        Date,
        DayType,
        BaseValue,
        DiscountValue,
        GrossValue,
        FinalValue,
        Observation,
        CreatedAt,
    }
}

mod m20240301_000004_create_finance_tables {
    use super::m20240301_000001_create_registry_tables::Workers;
    use super::m20240301_000002_create_quote_tables::Phases;
    use super::m20240301_000003_create_field_tables::ProductionEntries;
    use super::{id_column, money_column};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_finance_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Receivables::Table)
                        .if_not_exists()
                        .col(id_column(Receivables::Id))
                        .col(ColumnDef::new(Receivables::PhaseId).integer().not_null())
                        .col(money_column(Receivables::Amount))
                        .col(ColumnDef::new(Receivables::DueDate).date().not_null())
                        .col(ColumnDef::new(Receivables::Status).string_len(16).not_null())
                        .col(ColumnDef::new(Receivables::PaidDate).date().null())
                        .col(ColumnDef::new(Receivables::Observation).string().null())
                        .col(
                            ColumnDef::new(Receivables::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_receivables_phase_id")
                                .from(Receivables::Table, Receivables::PhaseId)
                                .to(Phases::Table, Phases::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payables::Table)
                        .if_not_exists()
                        .col(id_column(Payables::Id))
                        .col(ColumnDef::new(Payables::Kind).string_len(16).not_null())
                        .col(ColumnDef::new(Payables::ReferenceStart).date().not_null())
                        .col(ColumnDef::new(Payables::ReferenceEnd).date().not_null())
                        .col(ColumnDef::new(Payables::PhaseId).integer().null())
                        .col(ColumnDef::new(Payables::WorkerId).integer().null())
                        .col(money_column(Payables::Amount))
                        .col(ColumnDef::new(Payables::Status).string_len(16).not_null())
                        .col(ColumnDef::new(Payables::PaidDate).date().null())
                        .col(ColumnDef::new(Payables::Observation).string().null())
                        .col(
                            ColumnDef::new(Payables::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payables_phase_id")
                                .from(Payables::Table, Payables::PhaseId)
                                .to(Phases::Table, Phases::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payables_worker_id")
                                .from(Payables::Table, Payables::WorkerId)
                                .to(Workers::Table, Workers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PayableItems::Table)
                        .if_not_exists()
                        .col(id_column(PayableItems::Id))
                        .col(ColumnDef::new(PayableItems::PayableId).integer().not_null())
                        .col(
                            ColumnDef::new(PayableItems::ProductionEntryId)
                                .integer()
                                .not_null(),
                        )
                        .col(money_column(PayableItems::Value))
                        .col(ColumnDef::new(PayableItems::Observation).string().null())
                        .col(
                            ColumnDef::new(PayableItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payable_items_payable_id")
                                .from(PayableItems::Table, PayableItems::PayableId)
                                .to(Payables::Table, Payables::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_payable_items_production_entry_id")
                                .from(PayableItems::Table, PayableItems::ProductionEntryId)
                                .to(ProductionEntries::Table, ProductionEntries::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PayableItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Payables::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Receivables::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Receivables {
        Table,
        Id,
        PhaseId,
        Amount,
        DueDate,
        Status,
        PaidDate,
        Observation,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Payables {
        Table,
        Id,
        Kind,
        ReferenceStart,
        ReferenceEnd,
        PhaseId,
        WorkerId,
        Amount,
        Status,
        PaidDate,
        Observation,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum PayableItems {
        Table,
        Id,
        PayableId,
        ProductionEntryId,
        Value,
        Observation,
        CreatedAt,
    }
}

mod m20240301_000005_create_audit_log_table {
    use super::id_column;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_audit_log_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLog::Table)
                        .if_not_exists()
                        .col(id_column(AuditLog::Id))
                        .col(ColumnDef::new(AuditLog::Entity).string().not_null())
                        .col(ColumnDef::new(AuditLog::EntityId).integer().null())
                        .col(ColumnDef::new(AuditLog::Action).string_len(16).not_null())
                        .col(ColumnDef::new(AuditLog::Before).json().null())
                        .col(ColumnDef::new(AuditLog::After).json().null())
                        .col(ColumnDef::new(AuditLog::Actor).string().not_null())
                        .col(
                            ColumnDef::new(AuditLog::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_audit_log_entity")
                        .table(AuditLog::Table)
                        .col(AuditLog::Entity)
                        .col(AuditLog::EntityId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLog::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AuditLog {
        Table,
        Id,
        Entity,
        EntityId,
        Action,
        Before,
        After,
        Actor,
        CreatedAt,
    }
}
