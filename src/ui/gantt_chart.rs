use crate::model::timeline::{format_tick, format_timestamp, tick_times};
use crate::model::{DisplayProperties, LabelRow, TimelineViewport};
use crate::ui::theme;
use egui::{Align2, Color32, Id, Painter, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

const ROW_HEIGHT: f32 = theme::ROW_HEIGHT;
const ROW_GAP: f32 = theme::ROW_GAP;
const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const LABEL_WIDTH: f32 = theme::LABEL_WIDTH;

/// What happened in the chart this frame.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    /// Row and bar index under the pointer.
    pub hovered: Option<(usize, usize)>,
}

/// Render the presence timeline: a pinned time axis on top, one row per
/// label with its bars, the label column on the left.
pub fn show_presence_chart(
    rows: &[LabelRow],
    props: &DisplayProperties,
    viewport: &mut TimelineViewport,
    now_ms: i64,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let available = ui.available_size();
    let time_width = (available.x - LABEL_WIDTH).max(50.0);

    // Ctrl+scroll zooms around the pointer, plain horizontal scroll pans
    if let Some(pointer) = ui.ctx().pointer_hover_pos() {
        if ui.max_rect().contains(pointer) {
            // egui turns ctrl+wheel into a zoom delta
            let (scroll, zoom) = ui.input(|i| (i.smooth_scroll_delta, i.zoom_delta()));
            let x = pointer.x - (ui.max_rect().left() + LABEL_WIDTH);
            if zoom > 1.0 {
                viewport.zoom_at(x, true);
            } else if zoom < 1.0 {
                viewport.zoom_at(x, false);
            } else if scroll.x != 0.0 {
                viewport.pan(scroll.x);
            }
        }
    }

    let visible_start = viewport.start;
    let visible_end = viewport.x_to_time(time_width);
    let ticks = tick_times(visible_start, visible_end, props.tick_unit, props.tick_frequency);

    // Time axis
    let (header_response, header_painter) =
        ui.allocate_painter(Vec2::new(available.x, HEADER_HEIGHT), Sense::hover());
    draw_time_axis(
        &header_painter,
        header_response.rect,
        viewport,
        &ticks,
        &props.tick_format,
    );

    let chart_height = rows.len() as f32 * (ROW_HEIGHT + ROW_GAP) + ROW_GAP;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(
                Vec2::new(available.x, chart_height.max(ui.available_height())),
                Sense::hover(),
            );
            let area = response.rect;
            let time_rect = Rect::from_min_max(
                Pos2::new(area.left() + LABEL_WIDTH, area.top()),
                area.max,
            );

            painter.rect_filled(area, 0.0, theme::BG_DARK);

            // Gridlines under everything
            for &tick in &ticks {
                let x = time_rect.left() + viewport.time_to_x(tick);
                painter.line_segment(
                    [Pos2::new(x, area.top()), Pos2::new(x, area.bottom())],
                    Stroke::new(0.5, theme::GRID_LINE),
                );
            }

            let bars = painter.with_clip_rect(time_rect.intersect(painter.clip_rect()));
            let hover_pos = response.hover_pos();

            for (row_idx, row) in rows.iter().enumerate() {
                let y = area.top() + ROW_GAP + row_idx as f32 * (ROW_HEIGHT + ROW_GAP);

                // Full-length lane background
                let lane = Rect::from_min_size(
                    Pos2::new(time_rect.left(), y),
                    Vec2::new(time_rect.width(), ROW_HEIGHT),
                );
                bars.rect_filled(lane, 0.0, theme::BG_LANE);

                for (bar_idx, pair) in row.times.iter().enumerate() {
                    let x0 = time_rect.left() + viewport.time_to_x(pair.starting_time);
                    let x1 = time_rect.left() + viewport.time_to_x(pair.ending_time);
                    if x1 < time_rect.left() || x0 > time_rect.right() {
                        continue;
                    }
                    let bar = Rect::from_min_max(
                        Pos2::new(x0, y + theme::BAR_INSET),
                        Pos2::new(
                            x1.max(x0 + theme::MIN_BAR_WIDTH),
                            y + ROW_HEIGHT - theme::BAR_INSET,
                        ),
                    );
                    bars.rect_filled(
                        bar,
                        Rounding::same(theme::BAR_ROUNDING),
                        theme::state_color(row.state),
                    );

                    let hovered = hover_pos
                        .map(|p| time_rect.contains(p) && bar.expand2(Vec2::new(1.0, 0.0)).contains(p))
                        .unwrap_or(false);
                    if hovered {
                        interaction.hovered = Some((row_idx, bar_idx));
                        bars.rect_stroke(
                            bar.expand(1.0),
                            Rounding::same(theme::BAR_ROUNDING + 1.0),
                            Stroke::new(1.5, Color32::WHITE),
                        );
                    }
                }

                draw_row_label(ui, &painter, row, area.left(), y);
            }

            draw_now_line(&bars, time_rect, viewport, now_ms);

            // Label column divider
            painter.line_segment(
                [
                    Pos2::new(time_rect.left(), area.top()),
                    Pos2::new(time_rect.left(), area.bottom()),
                ],
                Stroke::new(1.0, theme::BORDER_SUBTLE),
            );
        });

    if let Some((row_idx, bar_idx)) = interaction.hovered {
        let row = &rows[row_idx];
        let pair = row.times[bar_idx];
        egui::show_tooltip_at_pointer(
            ui.ctx(),
            ui.layer_id(),
            Id::new(("bar-tip", row_idx, bar_idx)),
            |ui| {
                ui.strong(row.label.trim());
                ui.label(format!(
                    "{} → {}",
                    format_timestamp(pair.starting_time),
                    format_timestamp(pair.ending_time),
                ));
            },
        );
    }

    interaction
}

fn draw_time_axis(
    painter: &Painter,
    rect: Rect,
    viewport: &TimelineViewport,
    ticks: &[i64],
    tick_format: &str,
) {
    painter.rect_filled(rect, 0.0, theme::BG_HEADER);
    painter.line_segment(
        [rect.left_bottom(), rect.right_bottom()],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let time_left = rect.left() + LABEL_WIDTH;
    let clipped = painter.with_clip_rect(Rect::from_min_max(
        Pos2::new(time_left, rect.top()),
        rect.max,
    ));

    for &tick in ticks {
        let x = time_left + viewport.time_to_x(tick);
        clipped.line_segment(
            [
                Pos2::new(x, rect.bottom() - theme::TICK_SIZE),
                Pos2::new(x, rect.bottom()),
            ],
            Stroke::new(1.0, theme::TEXT_DIM),
        );
        let label = format_tick(tick, tick_format);
        if !label.is_empty() {
            clipped.text(
                Pos2::new(x, rect.top() + (HEADER_HEIGHT - theme::TICK_SIZE) / 2.0),
                Align2::CENTER_CENTER,
                label,
                theme::font_header(),
                theme::TEXT_SECONDARY,
            );
        }
    }
}

fn draw_row_label(ui: &Ui, painter: &Painter, row: &LabelRow, left: f32, y: f32) {
    let mut text_x = left + 8.0;

    if let Some(icon) = &row.icon {
        let icon_rect = Rect::from_min_size(
            Pos2::new(text_x, y + (ROW_HEIGHT - theme::ICON_SIZE) / 2.0),
            Vec2::splat(theme::ICON_SIZE),
        );
        egui::Image::from_bytes(icon.uri.clone(), icon.bytes.clone())
            .rounding(Rounding::same(theme::ICON_SIZE / 2.0))
            .paint_at(ui, icon_rect);
        text_x += theme::ICON_SIZE + 6.0;
    }

    let label_clip = Rect::from_min_max(
        Pos2::new(left, y),
        Pos2::new(left + LABEL_WIDTH - 4.0, y + ROW_HEIGHT),
    );
    painter.with_clip_rect(label_clip).text(
        Pos2::new(text_x, y + ROW_HEIGHT / 2.0),
        Align2::LEFT_CENTER,
        &row.label,
        theme::font_label(),
        theme::TEXT_PRIMARY,
    );
}

fn draw_now_line(painter: &Painter, time_rect: Rect, viewport: &TimelineViewport, now_ms: i64) {
    let x = time_rect.left() + viewport.time_to_x(now_ms);
    if x < time_rect.left() || x > time_rect.right() {
        return;
    }
    painter.line_segment(
        [Pos2::new(x, time_rect.top()), Pos2::new(x, time_rect.bottom())],
        Stroke::new(1.5, theme::NOW_LINE),
    );
}
