// Strategy selection by viewport class.

use crate::config::EngineConfig;
use crate::model::{LayoutMode, Viewport};

use super::LayoutStrategy;
use super::algorithms::{GridLayout, MobileGridLayout, SpiralLayout};

/// Which desktop arrangement the host asked for. Spiral is never picked by size.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DesktopPreference {
    #[default]
    Grid,
    Spiral,
}

pub fn select_mode(viewport: &Viewport, preference: DesktopPreference, cfg: &EngineConfig) -> LayoutMode {
    if viewport.width <= cfg.mobile.breakpoint {
        return LayoutMode::Mobile;
    }
    match preference {
        DesktopPreference::Grid => LayoutMode::DesktopGrid,
        DesktopPreference::Spiral => LayoutMode::DesktopSpiral,
    }
}

pub fn strategy_for(mode: LayoutMode) -> &'static dyn LayoutStrategy {
    match mode {
        LayoutMode::Mobile => &MobileGridLayout,
        LayoutMode::DesktopGrid => &GridLayout,
        LayoutMode::DesktopSpiral => &SpiralLayout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoint_is_inclusive() {
        let cfg = EngineConfig::default();
        let at = Viewport::new(480.0, 800.0, 0.0);
        let above = Viewport::new(481.0, 800.0, 0.0);
        assert_eq!(select_mode(&at, DesktopPreference::Grid, &cfg), LayoutMode::Mobile);
        assert_eq!(select_mode(&above, DesktopPreference::Grid, &cfg), LayoutMode::DesktopGrid);
    }

    #[test]
    fn test_spiral_only_when_preferred() {
        let cfg = EngineConfig::default();
        let desktop = Viewport::new(1920.0, 1080.0, 0.0);
        assert_eq!(select_mode(&desktop, DesktopPreference::Spiral, &cfg), LayoutMode::DesktopSpiral);
        // A phone stays on the mobile grid even if spiral was requested.
        let phone = Viewport::new(375.0, 700.0, 0.0);
        assert_eq!(select_mode(&phone, DesktopPreference::Spiral, &cfg), LayoutMode::Mobile);
    }

    #[test]
    fn test_same_class_same_strategy() {
        let cfg = EngineConfig::default();
        let a = select_mode(&Viewport::new(1300.0, 700.0, 0.0), DesktopPreference::Grid, &cfg);
        let b = select_mode(&Viewport::new(2500.0, 1300.0, 64.0), DesktopPreference::Grid, &cfg);
        assert_eq!(a, b);
    }
}
