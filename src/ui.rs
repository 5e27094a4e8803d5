use crate::forecast::ForecastResponse;
use crate::loan::{calculate_dscr, dscr_assessment};
use crate::models::SessionData;
use crate::numfmt::{format_currency, format_number};
use serde::Serialize;
use serde_json::json;

/// Serializes a value for embedding in a page. `<` is escaped so user text
/// can never terminate the surrounding script element.
fn embed_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

fn nav_links(active: &str) -> String {
    [
        ("/product-detail", "Products &amp; Expenses"),
        ("/financial-forecast", "Financial Forecast"),
        ("/loan-calculator", "Loan Calculator"),
        ("/startup-activities", "Startup Activities"),
    ]
    .iter()
    .map(|(href, label)| {
        let class = if *href == active { "tab active" } else { "tab" };
        format!("<a class=\"{class}\" href=\"{href}\">{label}</a>")
    })
    .collect::<Vec<_>>()
    .join("\n      ")
}

fn layout(title: &str, active: &str, body: &str, script: &str) -> String {
    LAYOUT_HTML
        .replace("{{TITLE}}", title)
        .replace("{{NAV}}", &nav_links(active))
        .replace("{{BODY}}", body)
        .replace("{{SCRIPT}}", script)
}

pub fn render_product_detail(data: &SessionData) -> String {
    let page_data = json!({
        "products": &data.products,
        "expenses": &data.expenses,
        "company_name": &data.company_name,
        "save_url": "/save-product-details",
        "continue_url": "/financial-forecast",
        "revision": data.revision,
    });
    let body = PRODUCT_BODY.replace("{{PAGE_DATA}}", &embed_json(&page_data));
    layout("Products & Expenses", "/product-detail", &body, PRODUCT_SCRIPT)
}

pub fn render_forecast(data: &SessionData, forecast: &ForecastResponse) -> String {
    let page_data = json!({
        "forecast": forecast,
        "params": &data.params,
        "assets": &data.assets,
        "liabilities": &data.liabilities,
        "revision": data.revision,
    });
    let body = FORECAST_BODY.replace("{{PAGE_DATA}}", &embed_json(&page_data));
    layout("Financial Forecast", "/financial-forecast", &body, FORECAST_SCRIPT)
}

pub fn render_loan(data: &SessionData) -> String {
    let loan = &data.loan;
    let params = &data.params;

    let results = if loan.monthly_payment > 0.0 {
        let dscr = calculate_dscr(params.net_operating_income, loan.monthly_payment * 12.0);
        let assessment = dscr_assessment(dscr);
        let monthly_net_profit = if params.annual_net_profit != 0.0 {
            params.annual_net_profit / 12.0
        } else {
            params.quarterly_net_profit / 3.0
        };
        LOAN_RESULTS
            .replace("{{PAYMENT}}", &format_currency(loan.monthly_payment))
            .replace("{{ANNUAL_NP}}", &format_currency(params.annual_net_profit))
            .replace("{{MONTHLY_NP}}", &format_currency(monthly_net_profit))
            .replace("{{DSCR}}", &format!("{dscr:.2}"))
            .replace("{{LEVEL}}", assessment.level)
            .replace("{{STATUS}}", assessment.dscr_status)
            .replace("{{MESSAGE}}", assessment.message)
    } else {
        String::new()
    };

    let amount = if loan.amount > 0.0 {
        format_number(loan.amount)
    } else {
        String::new()
    };
    let rate = if loan.amount > 0.0 {
        format_number(loan.interest_rate)
    } else {
        String::new()
    };
    let term = if loan.term_years > 0 {
        loan.term_years.to_string()
    } else {
        String::new()
    };

    let body = LOAN_BODY
        .replace("{{AMOUNT}}", &amount)
        .replace("{{RATE}}", &rate)
        .replace("{{TERM}}", &term)
        .replace("{{RESULTS}}", &results)
        .replace("{{SCHEDULE}}", &embed_json(&loan.schedule))
        .replace("{{TERM_YEARS}}", &loan.term_years.to_string());
    layout("Loan Calculator", "/loan-calculator", &body, LOAN_SCRIPT)
}

pub fn render_activities(data: &SessionData) -> String {
    let page_data = json!({
        "activities": &data.activities,
        "revision": data.revision,
    });
    let body = ACTIVITIES_BODY.replace("{{PAGE_DATA}}", &embed_json(&page_data));
    layout("Startup Activities", "/startup-activities", &body, ACTIVITIES_SCRIPT)
}

const LAYOUT_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} | Business Planner</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef3f8;
      --bg-2: #d7e4f2;
      --ink: #22303c;
      --accent: #2563ab;
      --accent-2: #1d3e5e;
      --danger: #c63b2b;
      --ok: #2d7a4b;
      --card: rgba(255, 255, 255, 0.92);
      --line: rgba(29, 62, 94, 0.12);
      --shadow: 0 20px 50px rgba(29, 62, 94, 0.16);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 55%),
        linear-gradient(150deg, var(--bg-1), #f6f9fc 65%, #eef3f8 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      justify-items: center;
      padding: 28px 16px 48px;
    }

    .app {
      width: min(980px, 100%);
      display: grid;
      gap: 20px;
    }

    header {
      background: var(--card);
      border-radius: 22px;
      box-shadow: var(--shadow);
      padding: 22px 28px;
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 14px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-weight: 600;
      font-size: clamp(1.5rem, 3vw, 2rem);
      margin: 0;
    }

    h2 { margin: 0; font-size: 1.15rem; }

    .tabs { display: flex; flex-wrap: wrap; gap: 6px; }

    .tab {
      border-radius: 999px;
      padding: 8px 14px;
      font-size: 0.9rem;
      font-weight: 600;
      color: #5d6b78;
      text-decoration: none;
      background: rgba(29, 62, 94, 0.06);
    }

    .tab.active { background: var(--accent-2); color: white; }

    .card {
      background: var(--card);
      border-radius: 18px;
      box-shadow: var(--shadow);
      border: 1px solid var(--line);
      padding: 20px 24px;
      display: grid;
      gap: 14px;
    }

    .card-head {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 10px;
    }

    input, select {
      font: inherit;
      color: inherit;
      border: 1px solid var(--line);
      border-radius: 10px;
      padding: 8px 10px;
      background: white;
      width: 100%;
    }

    input[readonly] { background: #f1f4f8; color: #5d6b78; }
    input[type="range"] { padding: 0; border: none; }
    .number-input, .number-display { text-align: right; }

    .grid-head, .grid-row { display: grid; gap: 10px; align-items: center; }
    .grid-head {
      font-size: 0.78rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #8191a0;
    }
    .products-grid { grid-template-columns: 3fr 1fr 1fr 1.2fr 36px; }
    .expenses-grid { grid-template-columns: 3fr 1.2fr 1.2fr 36px; }
    .items-grid { grid-template-columns: 3fr 1.2fr 36px; }
    .activities-grid { grid-template-columns: 2fr 3fr 0.9fr 1.6fr 36px; }

    .total-row {
      display: flex;
      align-items: center;
      justify-content: flex-end;
      gap: 12px;
      font-weight: 600;
      border-top: 1px solid var(--line);
      padding-top: 12px;
    }
    .total-row input { width: 180px; }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      font: inherit;
      font-weight: 600;
      cursor: pointer;
      transition: transform 120ms ease;
    }
    button:active { transform: scale(0.97); }

    .btn {
      background: rgba(29, 62, 94, 0.08);
      color: var(--accent-2);
      padding: 9px 16px;
    }
    .btn.primary {
      background: var(--accent);
      color: white;
      box-shadow: 0 10px 22px rgba(37, 99, 171, 0.3);
    }
    .btn.attention { background: var(--accent); color: white; }

    .remove {
      background: transparent;
      color: var(--danger);
      font-size: 1.15rem;
      padding: 4px 8px;
      line-height: 1;
    }

    .actions { display: flex; gap: 12px; flex-wrap: wrap; }

    .badge {
      background: var(--accent-2);
      color: white;
      border-radius: 999px;
      padding: 6px 14px;
      font-size: 0.85rem;
      font-weight: 600;
    }
    .badge.over { background: var(--danger); }

    .controls {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 14px;
    }
    .controls label, .loan-form label {
      display: grid;
      gap: 6px;
      font-size: 0.85rem;
      font-weight: 600;
      color: #5d6b78;
    }

    .loan-form {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 14px;
      align-items: end;
    }

    .seasonality-grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(68px, 1fr));
      gap: 8px;
    }
    .seasonality-grid label {
      display: grid;
      gap: 4px;
      font-size: 0.75rem;
      font-weight: 600;
      color: #8191a0;
      text-align: center;
    }

    .metrics {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 12px;
    }
    .stat {
      background: white;
      border: 1px solid var(--line);
      border-radius: 14px;
      padding: 12px 14px;
      display: grid;
      gap: 4px;
    }
    .stat .label {
      font-size: 0.72rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #8191a0;
    }
    .stat .value { font-size: 1.25rem; font-weight: 600; color: var(--accent-2); }

    .progress-cell { display: flex; align-items: center; gap: 8px; }
    .progress-value { font-weight: 600; min-width: 40px; text-align: right; }

    .chart { width: 100%; height: 260px; display: block; }
    .chart text { font-family: "Space Grotesk", "Trebuchet MS", sans-serif; }
    .chart-grid { stroke: rgba(29, 62, 94, 0.12); }
    .chart-axis { stroke: rgba(29, 62, 94, 0.3); stroke-dasharray: 4 6; }
    .chart-label { fill: #7a8694; font-size: 11px; }
    .bar-principal { fill: rgba(37, 99, 171, 0.75); }
    .bar-interest { fill: rgba(198, 59, 43, 0.7); }
    .bar-expense { fill: rgba(222, 148, 47, 0.75); }
    .bar-profit { fill: rgba(45, 122, 75, 0.75); }
    .bar-loss { fill: rgba(198, 59, 43, 0.7); }

    .assessment { margin: 0; border-radius: 12px; padding: 12px 14px; }
    .assessment.low { background: rgba(45, 122, 75, 0.1); }
    .assessment.medium { background: rgba(222, 148, 47, 0.14); }
    .assessment.high { background: rgba(198, 59, 43, 0.12); }

    .status { font-size: 0.95rem; color: #5d6b78; min-height: 1.2em; }
    .status[data-type="error"] { color: var(--danger); }
    .status[data-type="ok"] { color: var(--ok); }

    @media (max-width: 640px) {
      .card { padding: 16px; }
      .grid-head { display: none; }
      .grid-row { grid-template-columns: 1fr 1fr; }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>{{TITLE}}</h1>
      <nav class="tabs">
      {{NAV}}
      </nav>
    </header>
    {{BODY}}
    <div class="status" id="status"></div>
  </main>
  <script>
    const statusEl = document.getElementById('status');

    const setStatus = (message, type) => {
      if (!statusEl) return;
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const parseFormattedNumber = (input, defaultValue = 0) => {
      if (typeof input === 'number' && !isNaN(input)) return input;
      if (input === null || input === undefined) return defaultValue;
      const str = String(input).trim();
      if (str === '') return defaultValue;
      const number = parseFloat(str.replace(/,/g, ''));
      return isNaN(number) ? defaultValue : number;
    };

    const formatNumber = (num) => {
      if (num === null || num === undefined || num === '') return '';
      const number = parseFloat(String(num).replace(/,/g, ''));
      return isNaN(number) ? '' : number.toLocaleString('en-US');
    };

    const escHtml = (value) => String(value === null || value === undefined ? '' : value)
      .replace(/&/g, '&amp;')
      .replace(/</g, '&lt;')
      .replace(/>/g, '&gt;')
      .replace(/"/g, '&quot;');

    let latestRequest = 0;

    const sendJson = async (url, payload, apply) => {
      const ticket = ++latestRequest;
      setStatus('Saving...', '');
      try {
        const res = await fetch(url, {
          method: 'POST',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify(payload)
        });
        if (!res.ok) {
          throw new Error((await res.text()) || 'Request failed');
        }
        const data = await res.json();
        if (ticket !== latestRequest) return;
        if (apply) apply(data);
        setStatus('Saved', 'ok');
        setTimeout(() => { if (ticket === latestRequest) setStatus('', ''); }, 1200);
      } catch (err) {
        console.error('Request failed:', err);
        if (ticket === latestRequest) setStatus(err.message, 'error');
      }
    };

    const formatAxisValue = (value) => {
      if (Math.abs(value) >= 1000) {
        return (value / 1000).toFixed(1).replace(/\.0$/, '') + 'k';
      }
      const rounded = Math.round(value * 10) / 10;
      return Number.isInteger(rounded) ? rounded.toString() : rounded.toFixed(1);
    };

    const renderStackedBars = (svg, points) => {
      if (!svg) return;
      if (!points.length) {
        svg.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
        return;
      }

      const width = 600;
      const height = 260;
      const padX = 46;
      const padY = 34;
      const top = 16;

      let min = 0;
      let max = 0;
      points.forEach((point) => {
        let up = 0;
        let down = 0;
        point.parts.forEach((part) => {
          if (part.value >= 0) up += part.value; else down += part.value;
        });
        if (up > max) max = up;
        if (down < min) min = down;
      });
      if (min === max) max = min + 1;

      const range = max - min;
      const innerW = width - padX * 2;
      const scaleY = (height - top - padY) / range;
      const y = (value) => height - padY - (value - min) * scaleY;
      const step = innerW / points.length;
      const barW = Math.min(step * 0.6, 38);

      let out = '';
      const ticks = 4;
      for (let i = 0; i <= ticks; i += 1) {
        const value = min + (range * i) / ticks;
        out += '<line class="chart-grid" x1="' + padX + '" y1="' + y(value) + '" x2="' + (width - padX) + '" y2="' + y(value) + '" />';
        out += '<text class="chart-label" x="' + (padX - 8) + '" y="' + (y(value) + 4) + '" text-anchor="end">' + formatAxisValue(value) + '</text>';
      }
      out += '<line class="chart-axis" x1="' + padX + '" y1="' + y(0) + '" x2="' + (width - padX) + '" y2="' + y(0) + '" />';

      const labelEvery = points.length > 14 ? Math.ceil(points.length / 12) : 1;
      points.forEach((point, i) => {
        const xMid = padX + step * i + step / 2;
        let upBase = 0;
        let downBase = 0;
        point.parts.forEach((part) => {
          if (!part.value) return;
          let yTop;
          let barH;
          if (part.value >= 0) {
            yTop = y(upBase + part.value);
            barH = y(upBase) - yTop;
            upBase += part.value;
          } else {
            yTop = y(downBase);
            barH = y(downBase + part.value) - yTop;
            downBase += part.value;
          }
          const yearAttr = point.year === undefined ? '' : ' data-year="' + point.year + '"';
          out += '<rect class="' + part.cls + '" x="' + (xMid - barW / 2).toFixed(2) + '" y="' + yTop.toFixed(2) + '" width="' + barW.toFixed(2) + '" height="' + Math.max(barH, 0).toFixed(2) + '"' + yearAttr + ' />';
        });
        if (i % labelEvery === 0) {
          out += '<text class="chart-label" x="' + xMid + '" y="' + (height - padY + 16) + '" text-anchor="middle">' + point.label + '</text>';
        }
      });

      svg.innerHTML = out;
    };
  </script>
  {{SCRIPT}}
</body>
</html>
"##;

const PRODUCT_BODY: &str = r##"<script id="page-data" type="application/json">{{PAGE_DATA}}</script>
    <section class="card">
      <div class="card-head"><h2>Company</h2></div>
      <input id="companyName" type="text" placeholder="Company name" autocomplete="organization">
    </section>

    <section class="card">
      <div class="card-head">
        <h2>Products &amp; Services</h2>
        <button type="button" class="btn" id="addProductBtn" data-kind="product" data-action="add">Add product</button>
      </div>
      <div class="grid-head products-grid"><span>Description</span><span>Price ($)</span><span>Volume</span><span>Unit</span><span></span></div>
      <div id="product-rows"></div>
      <div class="total-row"><span>Total annual revenue</span><input id="total-sales" class="number-display" readonly value="0.00"></div>
    </section>

    <section class="card">
      <div class="card-head">
        <h2>Operating Expenses</h2>
        <button type="button" class="btn" id="addExpenseBtn" data-kind="expense" data-action="add">Add expense</button>
      </div>
      <div class="grid-head expenses-grid"><span>Item</span><span>Amount ($)</span><span>Frequency</span><span></span></div>
      <div id="expense-rows"></div>
    </section>

    <div class="actions">
      <button type="button" class="btn primary" id="saveDataBtn">Save changes</button>
      <button type="button" class="btn" id="saveAndContinueBtn">Save &amp; continue</button>
    </div>
"##;

const PRODUCT_SCRIPT: &str = r##"<script>
    (() => {
      const pageDataEl = document.getElementById('page-data');
      const productRowsEl = document.getElementById('product-rows');
      const expenseRowsEl = document.getElementById('expense-rows');
      const totalSalesEl = document.getElementById('total-sales');
      const companyEl = document.getElementById('companyName');
      if (!pageDataEl || !productRowsEl || !expenseRowsEl) return;

      const pageData = JSON.parse(pageDataEl.textContent);
      const model = {
        products: pageData.products || [],
        expenses: pageData.expenses || [],
        company_name: pageData.company_name || ''
      };
      if (companyEl) companyEl.value = model.company_name;

      const productRow = (p, i) => `
        <div class="grid-row products-grid">
          <input data-kind="product" data-field="description" data-index="${i}" value="${escHtml(p.description)}" placeholder="Product or service">
          <input class="number-input" data-kind="product" data-field="price" data-index="${i}" value="${formatNumber(p.price)}" placeholder="0">
          <input class="number-input" data-kind="product" data-field="sales_volume" data-index="${i}" value="${formatNumber(p.sales_volume)}" placeholder="0">
          <select data-kind="product" data-field="sales_volume_unit" data-index="${i}">
            <option value="monthly"${p.sales_volume_unit === 'quarterly' ? '' : ' selected'}>Monthly</option>
            <option value="quarterly"${p.sales_volume_unit === 'quarterly' ? ' selected' : ''}>Quarterly</option>
          </select>
          <button type="button" class="remove" data-kind="product" data-action="remove" data-index="${i}" title="Remove item">&times;</button>
        </div>`;

      const expenseRow = (e, i) => `
        <div class="grid-row expenses-grid">
          <input data-kind="expense" data-field="item" data-index="${i}" value="${escHtml(e.item)}"${e.readonly ? ' readonly' : ''} placeholder="Expense item">
          <input class="number-input" data-kind="expense" data-field="amount" data-index="${i}" value="${formatNumber(e.amount)}" placeholder="0">
          <select data-kind="expense" data-field="frequency" data-index="${i}">
            <option value="monthly"${e.frequency === 'quarterly' ? '' : ' selected'}>Monthly</option>
            <option value="quarterly"${e.frequency === 'quarterly' ? ' selected' : ''}>Quarterly</option>
          </select>
          ${e.readonly ? '<span></span>' : `<button type="button" class="remove" data-kind="expense" data-action="remove" data-index="${i}" title="Remove item">&times;</button>`}
        </div>`;

      const renderProducts = () => { productRowsEl.innerHTML = model.products.map(productRow).join(''); };
      const renderExpenses = () => { expenseRowsEl.innerHTML = model.expenses.map(expenseRow).join(''); };

      const updateTotals = () => {
        const total = model.products.reduce((sum, p) => {
          const periods = p.sales_volume_unit === 'quarterly' ? 4 : 12;
          return sum + parseFormattedNumber(p.price) * parseFormattedNumber(p.sales_volume) * periods;
        }, 0);
        if (totalSalesEl) {
          totalSalesEl.value = total.toLocaleString('en-US', { minimumFractionDigits: 2, maximumFractionDigits: 2 });
        }
      };

      const save = () => sendJson(pageData.save_url, {
        products: model.products,
        expenses: model.expenses,
        company_name: model.company_name
      });

      const actions = {
        'product:add': () => {
          model.products.push({ description: '', price: 0, sales_volume: 0, sales_volume_unit: 'monthly' });
          renderProducts();
        },
        'product:remove': (i) => { model.products.splice(i, 1); renderProducts(); },
        'expense:add': () => {
          model.expenses.push({ item: '', amount: 0, frequency: 'monthly', readonly: false });
          renderExpenses();
        },
        'expense:remove': (i) => {
          if (!model.expenses[i] || model.expenses[i].readonly) return;
          model.expenses.splice(i, 1);
          renderExpenses();
        }
      };

      document.addEventListener('click', (e) => {
        const target = e.target.closest('[data-action]');
        if (!target) return;
        const handler = actions[`${target.dataset.kind}:${target.dataset.action}`];
        if (!handler) return;
        handler(Number(target.dataset.index));
        updateTotals();
        save();
      });

      document.addEventListener('input', (e) => {
        const el = e.target;
        if (el === companyEl) {
          model.company_name = el.value;
          save();
          return;
        }
        const { kind, field, index } = el.dataset;
        if (!kind || !field) return;
        const rows = kind === 'product' ? model.products : model.expenses;
        const row = rows[Number(index)];
        if (!row) return;
        row[field] = el.classList.contains('number-input') ? parseFormattedNumber(el.value) : el.value;
        updateTotals();
        save();
      });

      document.addEventListener('focusout', (e) => {
        if (e.target.classList && e.target.classList.contains('number-input')) {
          e.target.value = formatNumber(parseFormattedNumber(e.target.value));
        }
      });

      const saveBtn = document.getElementById('saveDataBtn');
      if (saveBtn) saveBtn.addEventListener('click', save);

      const continueBtn = document.getElementById('saveAndContinueBtn');
      if (continueBtn) {
        continueBtn.addEventListener('click', async () => {
          await save();
          window.location.href = pageData.continue_url;
        });
      }

      renderProducts();
      renderExpenses();
      updateTotals();
    })();
  </script>
"##;

const FORECAST_BODY: &str = r##"<script id="page-data" type="application/json">{{PAGE_DATA}}</script>
    <section class="card">
      <div class="card-head"><h2>Assumptions</h2></div>
      <div class="controls">
        <label>COGS: <span id="cogsValue">35</span>%
          <input type="range" id="cogsPercentage" min="0" max="100" step="1">
        </label>
        <label>Tax rate: <span id="taxRateValue">8</span>%
          <input type="range" id="taxRate" min="0" max="50" step="0.5">
        </label>
        <label>Annual operating expenses ($)
          <input type="text" id="annualExpenses" class="number-input">
        </label>
        <label>Depreciation ($)
          <input type="text" id="depreciation" class="number-input">
        </label>
        <label>Interest expense ($)
          <input type="text" id="interestExpense" class="number-input">
        </label>
      </div>
    </section>

    <section class="card">
      <div class="card-head">
        <h2>Seasonality</h2>
        <button type="button" class="btn" id="normalize-seasonality">Normalize to 12</button>
      </div>
      <div id="seasonality-grid" class="seasonality-grid"></div>
    </section>

    <section class="card">
      <div class="card-head">
        <h2>Assets</h2>
        <button type="button" class="btn" id="add-asset-btn" data-kind="asset" data-action="add">Add asset</button>
      </div>
      <div class="grid-head items-grid"><span>Description</span><span>Amount ($)</span><span></span></div>
      <div id="asset-rows"></div>
      <div class="total-row"><span>Total assets</span><input id="totalAssets" class="number-display" readonly></div>
    </section>

    <section class="card">
      <div class="card-head">
        <h2>Liabilities</h2>
        <button type="button" class="btn" id="add-liability-btn" data-kind="liability" data-action="add">Add liability</button>
      </div>
      <div class="grid-head items-grid"><span>Description</span><span>Amount ($)</span><span></span></div>
      <div id="liability-rows"></div>
      <div class="total-row"><span>Total liabilities</span><input id="totalLiabilities" class="number-display" readonly></div>
    </section>

    <section class="card">
      <div class="card-head">
        <h2>Projection</h2>
        <div class="tabs">
          <label class="tab"><input type="radio" name="view" id="annual-view" checked> Annual</label>
          <label class="tab"><input type="radio" name="view" id="quarterly-view"> Quarterly</label>
        </div>
      </div>
      <div class="metrics">
        <div class="stat"><span class="label">Revenue</span><span class="value" id="revenue-display">$0.00</span></div>
        <div class="stat"><span class="label">Net profit</span><span class="value" id="net-profit-display">$0.00</span></div>
        <div class="stat"><span class="label">Profit margin</span><span class="value" id="profit-margin-display">0.00%</span></div>
        <div class="stat"><span class="label">Return on assets</span><span class="value" id="roa-display">0.00%</span></div>
        <div class="stat"><span class="label">Current ratio</span><span class="value" id="current-ratio-display">0.00</span></div>
        <div class="stat"><span class="label">Debt to equity</span><span class="value" id="de-ratio-display">0.00</span></div>
        <div class="stat"><span class="label">Interest coverage</span><span class="value" id="icr-display">0.00</span></div>
        <div class="stat"><span class="label">Op. cash flow ratio</span><span class="value" id="ocf-ratio-display">0.00</span></div>
      </div>
    </section>

    <section class="card">
      <div class="card-head"><h2>Monthly net profit</h2></div>
      <svg id="cashFlowChart" class="chart" viewBox="0 0 600 260" role="img" aria-label="Monthly net profit chart"></svg>
    </section>

    <section class="card">
      <div class="card-head"><h2>Expenses vs net profit</h2></div>
      <svg id="revenueExpenseChart" class="chart" viewBox="0 0 600 260" role="img" aria-label="Expenses and net profit chart"></svg>
    </section>
"##;

const FORECAST_SCRIPT: &str = r##"<script>
    (() => {
      const pageDataEl = document.getElementById('page-data');
      if (!pageDataEl) return;
      const el = (id) => document.getElementById(id);

      const pageData = JSON.parse(pageDataEl.textContent);
      let forecastData = pageData.forecast;
      const params = pageData.params || {};
      const model = { assets: pageData.assets || [], liabilities: pageData.liabilities || [] };

      const currency = new Intl.NumberFormat('en-US', { style: 'currency', currency: 'USD' });
      const months = ['Jan', 'Feb', 'Mar', 'Apr', 'May', 'Jun', 'Jul', 'Aug', 'Sep', 'Oct', 'Nov', 'Dec'];

      const cogsSlider = el('cogsPercentage');
      const taxSlider = el('taxRate');
      const seasonGrid = el('seasonality-grid');
      if (!cogsSlider || !taxSlider || !seasonGrid) return;

      cogsSlider.value = params.cogs_percentage != null ? params.cogs_percentage : 35;
      taxSlider.value = params.tax_rate != null ? params.tax_rate : 8;
      el('annualExpenses').value = formatNumber(params.annual_operating_expenses || 0);
      el('depreciation').value = formatNumber(params.depreciation || 0);
      el('interestExpense').value = formatNumber(params.interest_expense || 0);

      seasonGrid.innerHTML = months.map((name, i) => `
        <label>${name}<input type="number" class="seasonality-input" step="0.1" min="0" value="${params.seasonality && params.seasonality[i] != null ? params.seasonality[i] : 1}"></label>`).join('');
      const seasonalityInputs = () => Array.from(document.querySelectorAll('.seasonality-input'));

      const itemRow = (item, i, kind) => `
        <div class="grid-row items-grid">
          <input data-kind="${kind}" data-field="description" data-index="${i}" value="${escHtml(item.description)}" placeholder="Description">
          <input class="number-input" data-kind="${kind}" data-field="amount" data-index="${i}" value="${formatNumber(item.amount)}" placeholder="0">
          <button type="button" class="remove" data-kind="${kind}" data-action="remove" data-index="${i}" title="Remove item">&times;</button>
        </div>`;

      const renderRows = () => {
        el('asset-rows').innerHTML = model.assets.map((a, i) => itemRow(a, i, 'asset')).join('');
        el('liability-rows').innerHTML = model.liabilities.map((l, i) => itemRow(l, i, 'liability')).join('');
      };

      const updateTotals = () => {
        const totalAssets = model.assets.reduce((sum, a) => sum + parseFormattedNumber(a.amount), 0);
        const totalLiabilities = model.liabilities.reduce((sum, l) => sum + parseFormattedNumber(l.amount), 0);
        el('totalAssets').value = formatNumber(totalAssets);
        el('totalLiabilities').value = formatNumber(totalLiabilities);
        return { totalAssets, totalLiabilities };
      };

      const currentView = () => (el('quarterly-view') && el('quarterly-view').checked ? 'quarterly' : 'annual');

      const updateDisplay = (view) => {
        if (!forecastData) return;
        const data = forecastData[view];
        if (!data) return;
        el('revenue-display').textContent = currency.format(data.revenue || 0);
        el('net-profit-display').textContent = currency.format(data.net_profit || 0);
        el('profit-margin-display').textContent = (data.profit_margin || 0).toFixed(2) + '%';
        el('roa-display').textContent = (data.roa || 0).toFixed(2) + '%';
        el('current-ratio-display').textContent = (data.current_ratio || 0).toFixed(2);
        el('de-ratio-display').textContent = (data.debt_to_equity_ratio || 0).toFixed(2);
        el('icr-display').textContent = (data.interest_coverage_ratio || 0).toFixed(2);
        el('ocf-ratio-display').textContent = (data.operating_cash_flow_ratio || 0).toFixed(2);
      };

      const drawCharts = () => {
        if (!forecastData || !forecastData.monthly) return;
        renderStackedBars(el('cashFlowChart'), forecastData.monthly.map((m) => ({
          label: months[m.month - 1],
          parts: [{ value: m.net_profit, cls: m.net_profit < 0 ? 'bar-loss' : 'bar-profit' }]
        })));
        renderStackedBars(el('revenueExpenseChart'), forecastData.monthly.map((m) => ({
          label: months[m.month - 1],
          parts: [
            { value: m.cogs + m.operating_expenses + m.tax, cls: 'bar-expense' },
            { value: m.net_profit, cls: m.net_profit < 0 ? 'bar-loss' : 'bar-profit' }
          ]
        })));
      };

      const recalculate = () => {
        const totals = updateTotals();
        el('cogsValue').textContent = cogsSlider.value;
        el('taxRateValue').textContent = taxSlider.value;
        sendJson('/recalculate-forecast', {
          cogs_percentage: cogsSlider.value,
          annual_operating_expenses: parseFormattedNumber(el('annualExpenses').value),
          tax_rate: taxSlider.value,
          seasonality: seasonalityInputs().map((input) => parseFloat(input.value) || 0),
          assets: model.assets,
          liabilities: model.liabilities,
          depreciation: parseFormattedNumber(el('depreciation').value),
          current_assets: totals.totalAssets,
          current_liabilities: totals.totalLiabilities,
          interest_expense: parseFormattedNumber(el('interestExpense').value)
        }, (newForecast) => {
          forecastData = newForecast;
          updateDisplay(currentView());
          drawCharts();
        });
      };

      const actions = {
        'asset:add': () => { model.assets.push({ description: '', amount: 0 }); renderRows(); },
        'asset:remove': (i) => { model.assets.splice(i, 1); renderRows(); },
        'liability:add': () => { model.liabilities.push({ description: '', amount: 0 }); renderRows(); },
        'liability:remove': (i) => { model.liabilities.splice(i, 1); renderRows(); }
      };

      document.addEventListener('click', (e) => {
        const target = e.target.closest('[data-action]');
        if (!target) return;
        const handler = actions[`${target.dataset.kind}:${target.dataset.action}`];
        if (!handler) return;
        handler(Number(target.dataset.index));
        recalculate();
      });

      const normalizeBtn = el('normalize-seasonality');
      const setNormalizeActive = (isActive) => {
        if (normalizeBtn) normalizeBtn.classList.toggle('attention', isActive);
      };

      document.addEventListener('input', (e) => {
        const input = e.target;
        const { kind, field, index } = input.dataset;
        if (kind && field) {
          const rows = kind === 'asset' ? model.assets : model.liabilities;
          const row = rows[Number(index)];
          if (!row) return;
          row[field] = input.classList.contains('number-input') ? parseFormattedNumber(input.value) : input.value;
          recalculate();
          return;
        }
        if (input.classList.contains('seasonality-input')) {
          setNormalizeActive(true);
          recalculate();
          return;
        }
        if ([cogsSlider, taxSlider, el('annualExpenses'), el('depreciation'), el('interestExpense')].includes(input)) {
          recalculate();
        }
      });

      document.addEventListener('focusout', (e) => {
        if (e.target.classList && e.target.classList.contains('number-input')) {
          e.target.value = formatNumber(parseFormattedNumber(e.target.value));
        }
      });

      if (normalizeBtn) {
        normalizeBtn.addEventListener('click', () => {
          const inputs = seasonalityInputs();
          const values = inputs.map((input) => parseFloat(input.value) || 0);
          const total = values.reduce((sum, value) => sum + value, 0);
          if (total > 0) {
            inputs.forEach((input, i) => { input.value = ((values[i] / total) * 12).toFixed(2); });
            recalculate();
            setNormalizeActive(false);
          }
        });
      }

      const annualRadio = el('annual-view');
      const quarterlyRadio = el('quarterly-view');
      if (annualRadio) annualRadio.addEventListener('change', () => updateDisplay('annual'));
      if (quarterlyRadio) quarterlyRadio.addEventListener('change', () => updateDisplay('quarterly'));

      renderRows();
      updateTotals();
      el('cogsValue').textContent = cogsSlider.value;
      el('taxRateValue').textContent = taxSlider.value;
      updateDisplay('annual');
      drawCharts();
    })();
  </script>
"##;

const LOAN_BODY: &str = r##"<section class="card">
      <div class="card-head"><h2>Loan details</h2></div>
      <form method="post" action="/loan-calculator" class="loan-form">
        <label>Loan amount ($)
          <input type="text" id="loan_amount" name="loan_amount" class="number-input" value="{{AMOUNT}}" required>
        </label>
        <label>Interest rate (% / year)
          <input type="text" name="interest_rate" value="{{RATE}}" required>
        </label>
        <label>Term (years)
          <input type="text" name="loan_term" value="{{TERM}}" required>
        </label>
        <button type="submit" class="btn primary">Calculate</button>
      </form>
    </section>
{{RESULTS}}
    <section class="card">
      <div class="card-head">
        <h2 id="loan-chart-title">Payment schedule</h2>
        <button type="button" class="btn" id="back-to-yearly" style="display:none">Back to yearly</button>
      </div>
      <div id="chart-container" data-schedule='{{SCHEDULE}}' data-loan-term="{{TERM_YEARS}}">
        <svg id="loanChart" class="chart" viewBox="0 0 600 260" role="img" aria-label="Loan payment chart"></svg>
      </div>
    </section>
"##;

const LOAN_RESULTS: &str = r##"    <section class="card">
      <div class="card-head"><h2>Assessment</h2></div>
      <div class="metrics">
        <div class="stat"><span class="label">Monthly payment</span><span class="value">${{PAYMENT}}</span></div>
        <div class="stat"><span class="label">Annual net profit</span><span class="value">${{ANNUAL_NP}}</span></div>
        <div class="stat"><span class="label">Monthly net profit</span><span class="value">${{MONTHLY_NP}}</span></div>
        <div class="stat"><span class="label">DSCR</span><span class="value">{{DSCR}}</span></div>
      </div>
      <p class="assessment {{LEVEL}}"><strong>{{STATUS}}.</strong> {{MESSAGE}}</p>
    </section>
"##;

const LOAN_SCRIPT: &str = r##"<script>
    (() => {
      const amountInput = document.getElementById('loan_amount');
      if (amountInput) {
        amountInput.addEventListener('focusout', () => {
          amountInput.value = formatNumber(parseFormattedNumber(amountInput.value));
        });
        if (amountInput.form) {
          amountInput.form.addEventListener('submit', () => {
            amountInput.value = parseFormattedNumber(amountInput.value);
          });
        }
      }

      const container = document.getElementById('chart-container');
      const chartEl = document.getElementById('loanChart');
      const titleEl = document.getElementById('loan-chart-title');
      const backBtn = document.getElementById('back-to-yearly');
      if (!container || !chartEl || !titleEl) return;

      let schedule = [];
      try {
        schedule = JSON.parse(container.dataset.schedule || '[]');
      } catch (err) {
        console.error('Bad schedule payload:', err);
      }
      const termYears = parseInt(container.dataset.loanTerm, 10);
      if (!schedule.length || !termYears) {
        container.style.display = 'none';
        return;
      }

      const drawMonthly = (entries, title, drilled) => {
        titleEl.textContent = title;
        renderStackedBars(chartEl, entries.map((entry) => ({
          label: 'M' + entry.month,
          parts: [
            { value: entry.principal_payment, cls: 'bar-principal' },
            { value: entry.interest_payment, cls: 'bar-interest' }
          ]
        })));
        if (backBtn) backBtn.style.display = drilled ? '' : 'none';
      };

      const drawYearly = async () => {
        const res = await fetch('/api/loan-schedule');
        if (!res.ok) throw new Error('Unable to load the schedule');
        const data = await res.json();
        titleEl.textContent = 'Yearly payment summary (click a bar for months)';
        renderStackedBars(chartEl, data.yearly.map((year) => ({
          label: 'Y' + year.year,
          year: year.year,
          parts: [
            { value: year.principal, cls: 'bar-principal' },
            { value: year.interest, cls: 'bar-interest' }
          ]
        })));
        if (backBtn) backBtn.style.display = 'none';
      };

      chartEl.addEventListener('click', async (e) => {
        const year = e.target.getAttribute && e.target.getAttribute('data-year');
        if (!year) return;
        try {
          const res = await fetch('/api/loan-schedule?year=' + year);
          if (!res.ok) throw new Error('Unable to load year ' + year);
          const data = await res.json();
          drawMonthly(data.schedule, 'Monthly breakdown for year ' + year, true);
        } catch (err) {
          setStatus(err.message, 'error');
        }
      });

      if (backBtn) {
        backBtn.addEventListener('click', () => {
          drawYearly().catch((err) => setStatus(err.message, 'error'));
        });
      }

      if (termYears >= 2) {
        drawYearly().catch((err) => setStatus(err.message, 'error'));
      } else {
        drawMonthly(schedule, 'Monthly payment schedule', false);
      }
    })();
  </script>
"##;

const ACTIVITIES_BODY: &str = r##"<script id="page-data" type="application/json">{{PAGE_DATA}}</script>
    <section class="card">
      <div class="card-head">
        <h2>Startup activities</h2>
        <span id="total-weight-badge" class="badge">Total weight: 0%</span>
        <button type="button" class="btn" id="add-row-btn" data-kind="activity" data-action="add">Add activity</button>
      </div>
      <div class="grid-head activities-grid"><span>Activity</span><span>Description</span><span>Weight (%)</span><span>Progress</span><span></span></div>
      <div id="activity-rows"></div>
    </section>
"##;

const ACTIVITIES_SCRIPT: &str = r##"<script>
    (() => {
      const pageDataEl = document.getElementById('page-data');
      const rowsEl = document.getElementById('activity-rows');
      const badge = document.getElementById('total-weight-badge');
      if (!pageDataEl || !rowsEl) return;

      const model = (JSON.parse(pageDataEl.textContent).activities) || [];

      const activityRow = (a, i) => `
        <div class="grid-row activities-grid">
          <input data-field="activity" data-index="${i}" value="${escHtml(a.activity)}" placeholder="Activity">
          <input data-field="description" data-index="${i}" value="${escHtml(a.description)}" placeholder="Description">
          <input type="number" class="number-input weight-input" data-field="weight" data-index="${i}" min="0" max="100" value="${a.weight || 0}">
          <div class="progress-cell">
            <input type="range" class="progress-slider" data-field="progress" data-index="${i}" min="0" max="100" step="1" value="${a.progress || 0}">
            <span class="progress-value">${a.progress || 0}%</span>
          </div>
          <button type="button" class="remove" data-kind="activity" data-action="remove" data-index="${i}" title="Remove item">&times;</button>
        </div>`;

      const updateTotalWeight = (total) => {
        if (!badge) return;
        const sum = total !== undefined
          ? total
          : model.reduce((acc, a) => acc + (parseInt(a.weight, 10) || 0), 0);
        badge.textContent = `Total weight: ${sum}%`;
        badge.classList.toggle('over', sum > 100);
      };

      const render = () => {
        rowsEl.innerHTML = model.map(activityRow).join('');
        updateTotalWeight();
      };

      const save = () => sendJson('/save-activities', { activities: model }, (resp) => {
        if (resp.activities && resp.activities.length === model.length) {
          resp.activities.forEach((a, i) => { model[i].id = a.id; });
        }
        updateTotalWeight(resp.total_weight);
      });

      const actions = {
        'activity:add': () => {
          model.push({ id: 0, activity: '', description: '', weight: 0, progress: 0 });
          render();
        },
        'activity:remove': (i) => { model.splice(i, 1); render(); }
      };

      document.addEventListener('click', (e) => {
        const target = e.target.closest('[data-action]');
        if (!target) return;
        const handler = actions[`${target.dataset.kind}:${target.dataset.action}`];
        if (!handler) return;
        handler(Number(target.dataset.index));
        save();
      });

      document.addEventListener('input', (e) => {
        const input = e.target;
        const { field, index } = input.dataset;
        if (!field) return;
        const item = model[Number(index)];
        if (!item) return;
        if (field === 'weight' || field === 'progress') {
          item[field] = Math.max(0, Math.min(100, parseInt(input.value, 10) || 0));
          if (field === 'progress') {
            const label = input.parentElement && input.parentElement.querySelector('.progress-value');
            if (label) label.textContent = item.progress + '%';
          }
          updateTotalWeight();
        } else {
          item[field] = input.value;
        }
        save();
      });

      render();
    })();
  </script>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::build_forecast;
    use crate::loan::calculate_loan_schedule;
    use crate::models::{LoanState, Product, SessionData};

    #[test]
    fn product_page_embeds_the_session_model() {
        let mut data = SessionData::seeded();
        data.company_name = "Acme <script>".to_string();
        data.products.push(Product {
            description: "Widget".to_string(),
            price: 25.0,
            sales_volume: 40.0,
            ..Product::default()
        });

        let html = render_product_detail(&data);
        assert!(html.contains("page-data"));
        assert!(html.contains("Widget"));
        // Embedded JSON must not be able to close the script element.
        assert!(!html.contains("Acme <script>"));
        assert!(html.contains("Acme \\u003cscript>"));
    }

    #[test]
    fn forecast_page_carries_the_projection() {
        let data = SessionData::seeded();
        let forecast = build_forecast(&data.products, &data.params, 0.0, 0.0);
        let html = render_forecast(&data, &forecast);
        assert!(html.contains("recalculate-forecast"));
        assert!(html.contains("cashFlowChart"));
        assert!(html.contains("seasonality"));
    }

    #[test]
    fn loan_page_without_a_loan_has_no_results_block() {
        let html = render_loan(&SessionData::seeded());
        assert!(!html.contains("Assessment"));
        assert!(html.contains("data-loan-term=\"0\""));
    }

    #[test]
    fn loan_page_with_a_loan_renders_results_and_schedule() {
        let mut data = SessionData::seeded();
        let loan = calculate_loan_schedule(120_000.0, 5.0, 10);
        data.loan = LoanState {
            amount: 120_000.0,
            interest_rate: 5.0,
            term_years: 10,
            monthly_payment: loan.monthly_payment,
            schedule: loan.schedule,
        };
        data.params.net_operating_income = 50_000.0;

        let html = render_loan(&data);
        assert!(html.contains("Assessment"));
        assert!(html.contains("data-loan-term=\"10\""));
        assert!(html.contains("120,000"));
        assert!(html.contains("principal_payment"));
    }

    #[test]
    fn activities_page_shows_the_checklist() {
        let html = render_activities(&SessionData::seeded());
        assert!(html.contains("total-weight-badge"));
        assert!(html.contains("Register the business entity"));
    }
}
