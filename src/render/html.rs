/// Render the sunburst page that visualizes a generated data file.
///
/// The page loads `data_file` with a plain `<script src>` tag and reads the
/// tree from the global `variable`, so it works when opened from disk.
///
/// Important: we avoid `format!()` because the page contains many `{}` from JS
/// code, which would conflict with Rust formatting.
pub fn render_sunburst_page(data_file: &str, variable: &str) -> String {
    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Build operations</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  .crumbs { font-size: 14px; color: #333; min-height: 20px; }
  .chart { display: flex; justify-content: center; padding: 12px; }
  .muted { color: #777; font-size: 12px; }
</style>
<script src="https://cdn.jsdelivr.net/npm/d3@7"></script>
<script src="__DATA_FILE__"></script>
</head>
<body>
<header>
  <div class="crumbs" id="crumbs"></div>
  <div class="muted">Click a segment to zoom in, the centre to zoom out.</div>
</header>
<div class="chart" id="chart"></div>

<script>
const DATA = __VARIABLE__;

const size = Math.min(window.innerWidth, window.innerHeight - 80);
const radius = size / 6;

const hierarchy = d3.hierarchy(DATA)
  .sum(d => d.value || 0)
  .sort((a, b) => b.value - a.value);
const root = d3.partition().size([2 * Math.PI, hierarchy.height + 1])(hierarchy);
root.each(d => d.current = d);

const color = d3.scaleOrdinal(d3.quantize(d3.interpolateRainbow, (DATA.children || []).length + 1));

const arc = d3.arc()
  .startAngle(d => d.x0)
  .endAngle(d => d.x1)
  .padAngle(d => Math.min((d.x1 - d.x0) / 2, 0.005))
  .padRadius(radius * 1.5)
  .innerRadius(d => d.y0 * radius)
  .outerRadius(d => Math.max(d.y0 * radius, d.y1 * radius - 1));

const svg = d3.select("#chart").append("svg")
  .attr("viewBox", [-size / 2, -size / 2, size, size])
  .attr("width", size)
  .attr("height", size);

function topAncestor(d) {
  while (d.depth > 1) d = d.parent;
  return d;
}

function arcVisible(d) {
  return d.y1 <= 3 && d.y0 >= 1 && d.x1 > d.x0;
}

function showPath(d) {
  const names = d.ancestors().reverse().slice(1).map(n => n.data.name);
  document.getElementById("crumbs").textContent =
    names.length ? `${names.join(" / ")} (${d.value})` : `total (${d.value})`;
}

const path = svg.append("g")
  .selectAll("path")
  .data(root.descendants().slice(1))
  .join("path")
  .attr("fill", d => color(topAncestor(d).data.name))
  .attr("fill-opacity", d => arcVisible(d.current) ? (d.children ? 0.6 : 0.4) : 0)
  .attr("pointer-events", d => arcVisible(d.current) ? "auto" : "none")
  .attr("d", d => arc(d.current))
  .on("mouseover", (event, d) => showPath(d));

path.filter(d => d.children)
  .style("cursor", "pointer")
  .on("click", clicked);

path.append("title").text(d => `${d.ancestors().map(n => n.data.name).reverse().join(" / ")}\n${d.value}`);

const centre = svg.append("circle")
  .datum(root)
  .attr("r", radius)
  .attr("fill", "none")
  .attr("pointer-events", "all")
  .on("click", clicked);

function clicked(event, p) {
  centre.datum(p.parent || root);

  root.each(d => d.target = {
    x0: Math.max(0, Math.min(1, (d.x0 - p.x0) / (p.x1 - p.x0))) * 2 * Math.PI,
    x1: Math.max(0, Math.min(1, (d.x1 - p.x0) / (p.x1 - p.x0))) * 2 * Math.PI,
    y0: Math.max(0, d.y0 - p.depth),
    y1: Math.max(0, d.y1 - p.depth)
  });

  const t = svg.transition().duration(750);
  path.transition(t)
    .tween("data", d => {
      const i = d3.interpolate(d.current, d.target);
      return t => d.current = i(t);
    })
    .filter(function(d) {
      return +this.getAttribute("fill-opacity") || arcVisible(d.target);
    })
    .attr("fill-opacity", d => arcVisible(d.target) ? (d.children ? 0.6 : 0.4) : 0)
    .attr("pointer-events", d => arcVisible(d.target) ? "auto" : "none")
    .attrTween("d", d => () => arc(d.current));

  showPath(p);
}

showPath(root);
</script>
</body>
</html>
"##;

    TEMPLATE
        .replace("__DATA_FILE__", &escape_attr(data_file))
        .replace("__VARIABLE__", variable)
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
