// Application state for HTTP handlers
use crate::application::chart_service::ChartService;
use crate::application::dashboard_service::DashboardService;
use crate::application::export_service::ExportService;

#[derive(Clone)]
pub struct AppState {
    pub chart_service: ChartService,
    pub dashboard_service: DashboardService,
    pub export_service: ExportService,
}
