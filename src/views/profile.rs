use std::cmp::Ordering;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};
use time::OffsetDateTime;

use crate::{
    chart::{BarGroupData, BarValue, ChartSpec, Series},
    data::{ChartKind, Slot, STOCKS},
    helper::{
        clock,
        decimal_ext::{percent_or_placeholder, price_or_placeholder},
        number::format_share_change,
        Sign,
    },
    system::{Panel, ProfilePage},
    ui::{styles, text, Content},
};

/// Headline metrics shown next to the series chart, in display order.
const KEY_METRICS: [&str; 10] = [
    "peTTM",
    "pbAnnual",
    "epsTTM",
    "dividendYieldIndicatedAnnual",
    "beta",
    "52WeekHigh",
    "52WeekLow",
    "roeTTM",
    "netProfitMarginTTM",
    "currentRatioQuarterly",
];

pub fn render(frame: &mut Frame, rect: Rect, page: &mut ProfilePage) {
    let Some(symbol) = page.symbol.clone() else {
        frame.render_widget(
            Content::new(
                Span::styled(t!("Profile.NoSymbol"), styles::gray()),
                Span::styled(t!("Profile.NoSymbolHint"), styles::dark_gray()),
            ),
            rect,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(rect);

    // quote line; the screener's quote stands in until the live one arrives
    let stock = STOCKS.get(&symbol);
    let (price, change, percent) = page
        .quote
        .ready()
        .or_else(|| stock.as_ref().and_then(|s| s.quote.as_ref()))
        .map(|q| (q.current, q.change, q.percent_change))
        .unwrap_or_default();
    let style = styles::up(change.unwrap_or_default().sign());
    let name = stock
        .as_ref()
        .map(|s| s.display_name().to_string())
        .unwrap_or_default();
    let quote = Line::from(vec![
        Span::styled(format!(" {symbol} "), styles::ticker().add_modifier(Modifier::BOLD)),
        Span::styled(name, styles::primary()),
        Span::raw("  "),
        Span::styled(price_or_placeholder(price), style),
        Span::raw(" "),
        Span::styled(percent_or_placeholder(percent), style),
    ]);
    frame.render_widget(Paragraph::new(quote), chunks[0]);

    let tabs = Tabs::new(Panel::iter().map(|p| Line::from(format!(" {} ", p.label()))).collect())
        .style(styles::dark_gray())
        .highlight_style(styles::text_selected())
        .divider("|")
        .select(Panel::iter().position(|p| p == page.panel).unwrap_or(0));
    frame.render_widget(tabs, chunks[1]);

    let body = chunks[2];
    match page.panel {
        Panel::Overview => overview(frame, body, page),
        Panel::Financials => financials(frame, body, page),
        Panel::Earnings => earnings(frame, body, page),
        Panel::Analysts => analysts(frame, body, page),
        Panel::Insiders => insiders(frame, body, page),
        Panel::Ownership => ownership(frame, body, page),
        Panel::News => {
            let title = format!(" {} · {symbol} ", t!("Profile.Panel.News"));
            crate::views::news::render_feed(frame, body, &mut page.news, &title);
        }
    }
}

fn block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border())
        .title(Span::styled(title, styles::title()))
}

/// Draws `block` with a placeholder inside when `slot` has nothing to show. Returns
/// whether the placeholder was drawn.
fn placeholder<T>(frame: &mut Frame, rect: Rect, slot: &Slot<T>, block: Block<'_>) -> bool {
    let Some(content) = Content::for_slot(slot) else {
        return false;
    };
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    frame.render_widget(content, inner);
    true
}

fn date_label(timestamp: i64, intraday: bool) -> String {
    let Ok(at) = OffsetDateTime::from_unix_timestamp(timestamp) else {
        return String::new();
    };
    let at = at.to_offset(clock::local_offset());
    if intraday {
        format!("{:02}/{:02} {}", u8::from(at.month()), at.day(), clock::hh_mm(at))
    } else {
        at.date().to_string()
    }
}

fn day_range(frame: &mut Frame, rect: Rect, page: &ProfilePage) {
    let day = block(format!(" {} ", t!("Profile.Day")));
    if placeholder(frame, rect, &page.quote, day.clone()) {
        return;
    }
    let Some(quote) = page.quote.ready() else {
        return;
    };
    let items = vec![
        styles::item(t!("Profile.Open"), price_or_placeholder(quote.open)),
        styles::item(t!("Profile.High"), price_or_placeholder(quote.high)),
        styles::item(t!("Profile.Low"), price_or_placeholder(quote.low)),
        styles::item(
            t!("Profile.PrevClose"),
            price_or_placeholder(quote.previous_close),
        ),
    ];
    frame.render_widget(List::new(items).block(day), rect);
}

fn peers(frame: &mut Frame, rect: Rect, page: &ProfilePage) {
    let title = block(format!(" {} ", t!("Profile.Peers")));
    if placeholder(frame, rect, &page.peers, title.clone()) {
        return;
    }
    let Some(peers) = page.peers.ready() else {
        return;
    };
    let spans: Vec<Span> = peers
        .iter()
        .flat_map(|peer| [Span::styled(peer.to_string(), styles::ticker()), Span::raw("  ")])
        .collect();
    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .wrap(Wrap { trim: true })
            .block(title),
        rect,
    );
}

fn overview(frame: &mut Frame, rect: Rect, page: &mut ProfilePage) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(42), Constraint::Min(20)])
        .split(rect);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(6),
            Constraint::Length(4),
        ])
        .split(chunks[0]);
    day_range(frame, left[1], page);
    peers(frame, left[2], page);

    let company = block(format!(" {} ", t!("Profile.Company")));
    if !placeholder(frame, left[0], &page.profile, company.clone()) {
        if let Some(profile) = page.profile.ready() {
            let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "--".to_string());
            let mut items: Vec<ListItem> = vec![
                styles::item(t!("Profile.Name"), profile.display_name().to_string()),
                styles::item(t!("Profile.Ticker"), opt(&profile.ticker)),
                styles::item(t!("Profile.Exchange"), opt(&profile.exchange)),
                styles::item(t!("Profile.Industry"), opt(&profile.finnhub_industry)),
                styles::item(t!("Profile.Country"), opt(&profile.country)),
                styles::item(t!("Profile.Currency"), opt(&profile.currency)),
                styles::item(t!("Profile.Ipo"), opt(&profile.ipo)),
                styles::item(
                    t!("Profile.MarketCap"),
                    text::market_cap(profile.market_capitalization),
                ),
                styles::item(
                    t!("Profile.Shares"),
                    text::market_cap(profile.share_outstanding),
                ),
                styles::item(t!("Profile.Phone"), opt(&profile.phone)),
            ];
            if let Some(url) = &profile.weburl {
                items.push(ListItem::new(Span::styled(url.clone(), styles::link())));
            }
            frame.render_widget(List::new(items).block(company), left[0]);
        }
    }

    let resolution = page.timeframe.resolution(page.intraday);
    let title = format!(
        " {} · {} · {} · {}  [k] [f] [i] ",
        t!("Profile.Price"),
        page.timeframe.label(),
        resolution.label(),
        page.chart_kind.label()
    );
    if placeholder(frame, chunks[1], &page.candles, block(title.clone())) {
        return;
    }
    let Some(candles) = page.candles.ready() else {
        return;
    };
    let intraday = resolution.is_intraday();
    let series = match page.chart_kind {
        ChartKind::Candles => Series::Candles { candles, intraday },
        ChartKind::Line => Series::Line {
            points: candles
                .iter()
                .enumerate()
                .map(|(i, c)| (i as f64, c.close))
                .collect(),
            x_labels: candles
                .iter()
                .map(|c| date_label(c.timestamp, intraday))
                .collect(),
        },
    };
    let color = match (candles.first(), candles.last()) {
        (Some(first), Some(last)) => styles::up_color(
            last.close
                .partial_cmp(&first.close)
                .unwrap_or(Ordering::Equal),
        ),
        _ => ratatui::style::Color::Reset,
    };
    ChartSpec::new(series, page.revision())
        .title(title)
        .color(color)
        .render(frame, chunks[1], &mut page.charts.price);
}

fn financials(frame: &mut Frame, rect: Rect, page: &mut ProfilePage) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(20)])
        .split(rect);

    let metrics = block(format!(" {} ", t!("Profile.KeyMetrics")));
    if !placeholder(frame, chunks[0], &page.financials, metrics.clone()) {
        if let Some(data) = page.financials.ready() {
            let items: Vec<ListItem> = KEY_METRICS
                .iter()
                .map(|key| {
                    let label = t!(&format!("Metrics.Key.{key}"));
                    styles::item(label, text::number(data.metric(key)))
                })
                .collect();
            frame.render_widget(List::new(items).block(metrics), chunks[0]);
        }
    }
    if page.financials.ready().is_none() {
        let series = block(format!(" {} ", t!("Profile.Series")));
        placeholder(frame, chunks[1], &page.financials, series);
        return;
    }

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(4)])
        .split(chunks[1]);

    let cadence = page.cadence.label();
    let count = page.series().len();
    let position = page.metric + 1;
    let revision = page.revision();
    let (series, cache) = page.metric_chart();
    let Some(series) = series else {
        let title = format!(" {} · {cadence}  [c] ", t!("Profile.Series"));
        let block = block(title);
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);
        frame.render_widget(Content::empty(), inner);
        return;
    };
    let title = format!(
        " {} ({position}/{count})  [←/→] [c] ",
        series.label
    );
    let info = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(format!("{}  ", series.info.acronym), styles::title()),
            Span::styled(
                series
                    .latest()
                    .map(|p| format!("{} {:.2}", p.period, p.value))
                    .unwrap_or_default(),
                styles::gray(),
            ),
        ]),
        Line::from(Span::styled(series.info.description.clone(), styles::dark_gray())),
    ])
    .block(Block::default().borders(Borders::TOP).border_style(styles::border()))
    .wrap(Wrap { trim: true });
    frame.render_widget(info, right[1]);

    let x_labels = series.points.iter().map(|p| p.period.clone()).collect();
    ChartSpec::new(
        Series::Line {
            points: series.xy(),
            x_labels,
        },
        revision,
    )
    .title(title)
    .render(frame, right[0], cache);
}

fn earnings(frame: &mut Frame, rect: Rect, page: &mut ProfilePage) {
    let title = format!(" {} ", t!("Profile.Eps"));
    if page.earnings.ready().is_none() {
        placeholder(frame, rect, &page.earnings, block(title));
        return;
    }

    let revision = page.revision();
    let (points, cache) = page.eps_chart();
    let rows_height = u16::try_from(points.len()).unwrap_or(u16::MAX).saturating_add(3);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(rows_height.min(12))])
        .split(rect);

    let (actual_color, estimate_color) = styles::eps_colors();
    let legend = format!(
        " {title}· ● {} ● {} ",
        t!("Eps.Actual"),
        t!("Eps.Estimate")
    );
    ChartSpec::new(Series::Eps(points), revision)
        .title(legend)
        .color(actual_color)
        .render(frame, chunks[0], cache);

    let rows = points
        .iter()
        .rev()
        .map(|p| {
            let style = if p.is_beat() {
                styles::up(Ordering::Greater)
            } else {
                styles::up(Ordering::Less)
            };
            Row::new(vec![
                Cell::from(p.period.clone()),
                Cell::from(text::align_right(&format!("{:.2}", p.actual), 8))
                    .style(Style::default().fg(actual_color)),
                Cell::from(text::align_right(&format!("{:.2}", p.estimate), 8))
                    .style(Style::default().fg(estimate_color)),
                Cell::from(p.label.clone()).style(style),
            ])
        })
        .collect::<Vec<_>>();
    let header = Row::new(vec![
        Cell::from(t!("Eps.Period")),
        Cell::from(text::align_right(&t!("Eps.Actual"), 8)),
        Cell::from(text::align_right(&t!("Eps.Estimate"), 8)),
        Cell::from(t!("Eps.Surprise")),
    ])
    .style(styles::header());
    let table = Table::new(rows)
        .header(header)
        .block(Block::default().borders(Borders::ALL).border_style(styles::border()))
        .widths(&[
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Min(12),
        ])
        .column_spacing(2);
    frame.render_widget(table, chunks[1]);
}

fn analysts(frame: &mut Frame, rect: Rect, page: &mut ProfilePage) {
    let title = format!(" {} ", t!("Profile.Recommendations"));
    if placeholder(frame, rect, &page.recommendations, block(title.clone())) {
        return;
    }
    let Some(trends) = page.recommendations.ready() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(1)])
        .split(rect);

    let groups = trends
        .iter()
        .map(|trend| BarGroupData {
            label: trend.period.get(..7).unwrap_or(&trend.period).to_string(),
            bars: trend
                .buckets()
                .iter()
                .zip(styles::RECOMMENDATION_COLORS)
                .map(|(value, color)| BarValue {
                    value: u64::from(*value),
                    color,
                })
                .collect(),
        })
        .collect();
    ChartSpec::new(Series::Bars(groups), page.revision())
        .title(title)
        .render(frame, chunks[0], &mut page.charts.analysts);

    let labels = [
        t!("Analysts.StrongBuy"),
        t!("Analysts.Buy"),
        t!("Analysts.Hold"),
        t!("Analysts.Sell"),
        t!("Analysts.StrongSell"),
    ];
    let mut legend = vec![Span::raw(" ")];
    for (label, color) in labels.into_iter().zip(styles::RECOMMENDATION_COLORS) {
        legend.push(Span::styled("■ ", Style::default().fg(color)));
        legend.push(Span::styled(format!("{label}  "), styles::gray()));
    }
    frame.render_widget(Paragraph::new(Line::from(legend)), chunks[1]);
}

fn insiders(frame: &mut Frame, rect: Rect, page: &mut ProfilePage) {
    let title = format!(" {} ", t!("Profile.Insiders"));
    if placeholder(frame, rect, &page.insiders, block(title.clone())) {
        return;
    }
    let rows = page
        .insiders
        .ready()
        .map(|txs| {
            txs.iter()
                .map(|tx| {
                    let change_style = styles::up(tx.change.unwrap_or_default().cmp(&0));
                    Row::new(vec![
                        Cell::from(text::ellipsis(&tx.name, 28)),
                        Cell::from(
                            tx.transaction_date
                                .clone()
                                .or_else(|| tx.filing_date.clone())
                                .unwrap_or_default(),
                        ),
                        Cell::from(tx.transaction_code.clone().unwrap_or_default()),
                        Cell::from(text::align_right(
                            &tx.change.map(format_share_change).unwrap_or_default(),
                            10,
                        ))
                        .style(change_style),
                        Cell::from(text::align_right(
                            &tx.share
                                .map(|s| crate::helper::format_volume(s.unsigned_abs()))
                                .unwrap_or_default(),
                            10,
                        )),
                        Cell::from(text::align_right(
                            &price_or_placeholder(tx.transaction_price),
                            10,
                        )),
                    ])
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let header = Row::new(vec![
        Cell::from(t!("Insiders.Name")),
        Cell::from(t!("Insiders.Date")),
        Cell::from(t!("Insiders.Code")),
        Cell::from(text::align_right(&t!("Insiders.Change"), 10)),
        Cell::from(text::align_right(&t!("Insiders.Held"), 10)),
        Cell::from(text::align_right(&t!("Insiders.Price"), 10)),
    ])
    .style(styles::header())
    .bottom_margin(1);
    let table = Table::new(rows)
        .header(header)
        .block(block(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .widths(&[
            Constraint::Min(20),
            Constraint::Length(11),
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ])
        .column_spacing(2);
    frame.render_stateful_widget(table, rect, &mut page.insider_table);
}

fn ownership(frame: &mut Frame, rect: Rect, page: &mut ProfilePage) {
    let title = format!(" {} ", t!("Profile.Ownership"));
    if placeholder(frame, rect, &page.ownership, block(title.clone())) {
        return;
    }
    let rows = page
        .ownership
        .ready()
        .map(|holders| {
            holders
                .iter()
                .enumerate()
                .map(|(idx, holder)| {
                    Row::new(vec![
                        Cell::from(Span::styled(format!("{:>2}", idx + 1), styles::dark_gray())),
                        Cell::from(text::ellipsis(&holder.name, 40)),
                        Cell::from(text::align_right(
                            &holder
                                .ownership
                                .map_or_else(|| "--".to_string(), |v| format!("{v:.2}%")),
                            9,
                        )),
                        Cell::from(holder.date.clone().unwrap_or_default()),
                        Cell::from(holder.form_type.clone().unwrap_or_default()),
                    ])
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from(t!("Ownership.Holder")),
        Cell::from(text::align_right(&t!("Ownership.Stake"), 9)),
        Cell::from(t!("Ownership.Date")),
        Cell::from(t!("Ownership.Form")),
    ])
    .style(styles::header())
    .bottom_margin(1);
    let table = Table::new(rows)
        .header(header)
        .block(block(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .widths(&[
            Constraint::Length(2),
            Constraint::Min(24),
            Constraint::Length(9),
            Constraint::Length(11),
            Constraint::Length(8),
        ])
        .column_spacing(2);
    frame.render_stateful_widget(table, rect, &mut page.ownership_table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{CompanyProfile, Quote, RecommendationTrend, Symbol},
        eps::EarningsEntry,
    };
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(page: &mut ProfilePage) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).expect("terminal");
        terminal
            .draw(|frame| {
                let area = frame.size();
                render(frame, area, page);
            })
            .expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol.as_str())
            .collect()
    }

    #[test]
    fn every_panel_renders_its_slot_state() {
        let _lock = crate::helper::TEST_LOCALE_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        rust_i18n::set_locale("en");

        let mut page = ProfilePage::default();
        page.select(Symbol::new("ZZVIEW"));
        page.set_profile(Slot::Ready(CompanyProfile {
            name: Some("View Test Corp".to_string()),
            ticker: Some("ZZVIEW".to_string()),
            ..CompanyProfile::default()
        }));
        page.set_earnings(Slot::Ready(vec![EarningsEntry {
            period: "2024-03-31".to_string(),
            actual: Some(1.53),
            estimate: Some(1.5),
            ..EarningsEntry::default()
        }]));
        page.recommendations = Slot::Ready(vec![RecommendationTrend {
            period: "2024-03-01".to_string(),
            buy: 3,
            ..RecommendationTrend::default()
        }]);
        page.insiders = Slot::Failed("HTTP 500: boom".to_string());
        page.ownership = Slot::Empty;
        page.quote = Slot::Ready(Quote {
            current: Some(101.25),
            previous_close: Some(99.5),
            ..Quote::default()
        });
        page.peers = Slot::Ready(vec![Symbol::new("ZZPEERA"), Symbol::new("ZZPEERB")]);

        for panel in Panel::iter() {
            page.panel = panel;
            let text = screen(&mut page);
            assert!(text.contains("ZZVIEW"), "{panel:?}");
            assert!(text.contains("101.25"), "{panel:?}");
            match panel {
                Panel::Overview => {
                    assert!(text.contains("View Test Corp"));
                    assert!(text.contains("ZZPEERA"));
                    assert!(text.contains("99.50"));
                }
                Panel::Earnings => assert!(text.contains("Beat: 0.03")),
                Panel::Insiders => assert!(text.contains("HTTP 500: boom")),
                _ => (),
            }
        }
    }

    #[test]
    fn without_a_symbol_the_page_asks_for_one() {
        let _lock = crate::helper::TEST_LOCALE_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        rust_i18n::set_locale("en");
        let mut page = ProfilePage::default();
        assert!(screen(&mut page).contains("/"));
    }

    #[test]
    fn date_labels_depend_on_resolution() {
        assert_eq!(date_label(1_718_000_000, false).len(), 10);
        assert!(date_label(1_718_000_000, true).contains(':'));
    }
}
