/*!

This is the long-form manual for `referendum_regions` and `refmap`.

## Inputs

Four tables are needed for a run:
* the referendum results, one row per town
* the region reference table (`code`, `name`)
* the department reference table (`code`, `name`, `region_code`)
* the region boundaries, as a GeoJSON `FeatureCollection`

### Referendum results

A CSV file separated by `;` with the following header:

```text
Department code;Department name;Town code;Town name;Registered;Abstentions;Null;Choice A;Choice B
```

The codes are read as text: `01` and `1` are two different departments.

### Regions and departments

CSV files separated by `,`. Extra columns (`id`, `slug`, ...) are ignored.
The names of the columns can be changed in the configuration file.

### Boundaries

Each feature must carry the code of its region in one of its properties
(`code` by default). The value must be a string: a number such as `1`
is rejected, since it would never match the code "01".

## Processing rules

1. Departments are matched to their region. A department whose region is
   not in the region table is dropped.
2. Towns are matched to their department. A town whose department is not
   matched is dropped.
3. Towns whose department code contains the letter `Z` (overseas
   departments and collectivities, French living abroad) are excluded.
4. The counts are summed per region.
5. The ratio of each region is `Choice A / (Choice A + Choice B)`.
   When no ballot was expressed in a region, the ratio is undefined and the
   `undefinedRatio` rule decides: `abort` fails the run, `skip` leaves the
   region out.
6. The ratios are attached to the boundaries with the same region code.
   Boundaries without a result, and results without a boundary, are left
   out.

Every drop is counted and reported in the `diagnostics` section of the
summary.

The following conditions fail the run, and nothing is written:
* a department code found twice in the reference data
* a region code associated with two different names
* a region code found on two boundaries
* a count that does not fit in 64 bits once summed
* an undefined ratio under the `abort` rule

## Configuration file

```json
{
  "outputSettings": {
    "name": "Referendum",
    "summaryPath": "summary.json",
    "geojsonPath": "map.geojson"
  },
  "sources": {
    "referendum": { "filePath": "referendum.csv", "delimiter": ";" },
    "regions": { "filePath": "regions.csv" },
    "departments": { "filePath": "departments.csv" },
    "geometry": { "filePath": "regions.geojson", "regionCodeProperty": "code" }
  },
  "rules": { "undefinedRatio": "skip" }
}
```

The paths are relative to the directory of the configuration file.

*/
